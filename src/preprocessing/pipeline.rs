use image::{DynamicImage, GenericImageView};
use serde::Serialize;
use std::time::Instant;

use super::steps::{self, Step};
use crate::config::NormalizeConfig;
use crate::engine::OcrEngine;
use crate::error::FlyerError;

/// What a stage did to the page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum StageOutcome {
    /// Image was modified
    Applied,
    /// Stage ran and decided no change was needed
    Unchanged,
    /// Stage could not run; the image passed through as-is
    Skipped(String),
}

/// Timing and outcome for a single stage
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub name: String,
    pub outcome: StageOutcome,
    pub time_ms: u64,
}

/// Normalized page plus per-stage reports
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedImage {
    /// Normalized image (not serialized)
    #[serde(skip)]
    pub image: DynamicImage,
    pub total_time_ms: u64,
    pub stages: Vec<StageReport>,
}

/// Prepares a raw page for recognition
///
/// Stages run in a fixed order: upscale, orientation, deskew, denoise,
/// binarize. A stage that can't do its job reports `Skipped` and hands the
/// image on untouched; only an unusable input fails the whole call.
pub struct Normalizer<'a> {
    config: &'a NormalizeConfig,
    engine: &'a dyn OcrEngine,
    binarize: bool,
}

impl<'a> Normalizer<'a> {
    pub fn new(config: &'a NormalizeConfig, engine: &'a dyn OcrEngine) -> Self {
        Self {
            config,
            engine,
            binarize: config.binarize,
        }
    }

    /// Override the configured binarization for this normalizer.
    pub fn binarize(mut self, enabled: bool) -> Self {
        self.binarize = enabled;
        self
    }

    pub fn normalize(&self, image: DynamicImage) -> Result<NormalizedImage, FlyerError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(FlyerError::Image(format!(
                "Image has no pixels ({}x{})",
                width, height
            )));
        }

        let start = Instant::now();
        let mut stages = Vec::new();
        let config = self.config;

        let mut img = self.run_stage("upscale", image, &mut stages, |img| {
            steps::resize::apply(img, config.min_width, config.min_height)
        });

        if config.detect_orientation {
            img = self.run_stage("orientation", img, &mut stages, |img| {
                steps::orientation::apply(img, self.engine)
            });
        }

        img = self.run_stage("deskew", img, &mut stages, |img| {
            steps::deskew::apply(img, &config.deskew)
        });

        img = self.run_stage("denoise", img, &mut stages, |img| {
            steps::denoise::apply(img, &config.denoise)
        });

        if self.binarize {
            img = self.run_stage("binarize", img, &mut stages, steps::threshold::apply);
        }

        Ok(NormalizedImage {
            image: img,
            total_time_ms: start.elapsed().as_millis() as u64,
            stages,
        })
    }

    fn run_stage<F>(
        &self,
        name: &str,
        img: DynamicImage,
        reports: &mut Vec<StageReport>,
        stage_fn: F,
    ) -> DynamicImage
    where
        F: FnOnce(DynamicImage) -> Step,
    {
        let stage_start = Instant::now();
        let step = stage_fn(img);

        if let StageOutcome::Skipped(reason) = &step.outcome {
            tracing::debug!("Stage {} skipped: {}", name, reason);
        }

        reports.push(StageReport {
            name: name.to_string(),
            outcome: step.outcome,
            time_ms: stage_start.elapsed().as_millis() as u64,
        });
        step.image
    }
}
