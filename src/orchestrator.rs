//! Per-document driver
//!
//! Runs normalize → acquire → extract on every page and stitches the records
//! back together in page order. A page that fails is reported and skipped;
//! it never takes the rest of the document down with it.

use image::DynamicImage;
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::Instant;

use crate::acquisition::TextAcquirer;
use crate::config::Config;
use crate::engine::OcrEngine;
use crate::error::FlyerError;
use crate::extract::Extractor;
use crate::lexicon::Lexicon;
use crate::preprocessing::{Normalizer, StageReport};
use crate::record::ProductRecord;

/// A page as handed over by the loader; a decode failure only sinks that page.
pub type RawPage = Result<DynamicImage, FlyerError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    /// At least one record
    Ok,
    /// Processed fine, nothing extracted
    Empty,
    /// Fatal error for this page
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    /// 1-based
    pub page: usize,
    pub status: PageStatus,
    pub records: usize,
    pub text_chars: usize,
    pub words: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    pub stages: Vec<StageReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub time_ms: u64,
}

impl PageReport {
    fn failed(page: usize, error: String, time_ms: u64) -> Self {
        Self {
            page,
            status: PageStatus::Failed,
            records: 0,
            text_chars: 0,
            words: 0,
            profile: None,
            stages: Vec::new(),
            error: Some(error),
            time_ms,
        }
    }
}

/// Yield counts for one document
#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentReport {
    pub pages_attempted: usize,
    pub pages_with_records: usize,
    pub total_records: usize,
    pub pages: Vec<PageReport>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentResult {
    pub products: Vec<ProductRecord>,
    pub report: DocumentReport,
}

struct PageOutcome {
    records: Vec<ProductRecord>,
    report: PageReport,
}

impl PageOutcome {
    fn panicked(number: usize) -> Self {
        tracing::warn!("Page {} worker panicked", number);
        Self {
            records: Vec::new(),
            report: PageReport::failed(number, "page worker panicked".to_string(), 0),
        }
    }
}

pub struct Orchestrator<'a> {
    config: &'a Config,
    engine: &'a dyn OcrEngine,
    lexicon: &'a Lexicon,
    binarize: bool,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: &'a Config, engine: &'a dyn OcrEngine, lexicon: &'a Lexicon) -> Self {
        Self {
            config,
            engine,
            lexicon,
            binarize: config.normalize.binarize,
        }
    }

    /// Override binarization for this document.
    pub fn binarize(mut self, enabled: bool) -> Self {
        self.binarize = enabled;
        self
    }

    /// Process already-decoded pages.
    pub fn process_images(&self, pages: Vec<DynamicImage>) -> DocumentResult {
        self.process_document(pages.into_iter().map(Ok).collect())
    }

    /// Process every page and aggregate the records in page order.
    pub fn process_document(&self, pages: Vec<RawPage>) -> DocumentResult {
        let start = Instant::now();
        let workers = self.config.workers.max(1);

        let outcomes = if workers == 1 || pages.len() <= 1 {
            pages
                .into_iter()
                .enumerate()
                .map(|(i, page)| {
                    let number = i + 1;
                    panic::catch_unwind(AssertUnwindSafe(|| self.process_page(number, page)))
                        .unwrap_or_else(|_| PageOutcome::panicked(number))
                })
                .collect()
        } else {
            self.process_parallel(pages, workers)
        };

        let mut result = DocumentResult::default();
        for outcome in outcomes {
            result.report.pages_attempted += 1;
            if !outcome.records.is_empty() {
                result.report.pages_with_records += 1;
            }
            result.report.total_records += outcome.records.len();
            result.products.extend(outcome.records);
            result.report.pages.push(outcome.report);
        }

        tracing::info!(
            "Document done: {} of {} pages produced records, {} records in {}ms",
            result.report.pages_with_records,
            result.report.pages_attempted,
            result.report.total_records,
            start.elapsed().as_millis()
        );

        result
    }

    /// Up to `workers` pages at a time on scoped threads, joined in page order.
    fn process_parallel(&self, pages: Vec<RawPage>, workers: usize) -> Vec<PageOutcome> {
        let mut outcomes = Vec::with_capacity(pages.len());
        let mut pending = pages.into_iter().enumerate().peekable();

        while pending.peek().is_some() {
            let batch: Vec<(usize, RawPage)> = pending.by_ref().take(workers).collect();

            thread::scope(|s| {
                let handles: Vec<_> = batch
                    .into_iter()
                    .map(|(i, page)| {
                        let number = i + 1;
                        (number, s.spawn(move || self.process_page(number, page)))
                    })
                    .collect();

                for (number, handle) in handles {
                    let outcome = handle
                        .join()
                        .unwrap_or_else(|_| PageOutcome::panicked(number));
                    outcomes.push(outcome);
                }
            });
        }

        outcomes
    }

    fn process_page(&self, number: usize, page: RawPage) -> PageOutcome {
        let start = Instant::now();

        match self.run_page(number, page) {
            Ok((records, mut report)) => {
                report.time_ms = start.elapsed().as_millis() as u64;
                PageOutcome { records, report }
            }
            Err(e) => {
                tracing::warn!("Page {} failed: {}", number, e);
                PageOutcome {
                    records: Vec::new(),
                    report: PageReport::failed(number, e.to_string(), start.elapsed().as_millis() as u64),
                }
            }
        }
    }

    fn run_page(
        &self,
        number: usize,
        page: RawPage,
    ) -> Result<(Vec<ProductRecord>, PageReport), FlyerError> {
        let image = page?;

        let normalized = Normalizer::new(&self.config.normalize, self.engine)
            .binarize(self.binarize)
            .normalize(image)?;

        let acquired = TextAcquirer::new(self.engine, &self.config.acquisition).acquire(&normalized.image);
        let words = acquired.text.split_whitespace().count();

        let mut report = PageReport {
            page: number,
            status: PageStatus::Empty,
            records: 0,
            text_chars: acquired.text.chars().count(),
            words,
            profile: acquired.selected.clone(),
            stages: normalized.stages,
            error: None,
            time_ms: 0,
        };

        if words < self.config.extraction.min_page_words {
            tracing::info!("Page {}: only {} words recognized, skipping", number, words);
            return Ok((Vec::new(), report));
        }

        let mut records = Extractor::new(self.lexicon, &self.config.extraction).extract(&acquired.text);
        for record in &mut records {
            record.page = Some(number);
        }

        tracing::debug!("Page {}: {} words, {} records", number, words, records.len());

        report.records = records.len();
        if !records.is_empty() {
            report.status = PageStatus::Ok;
        }
        Ok((records, report))
    }
}
