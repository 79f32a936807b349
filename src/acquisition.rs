//! Best-of-N text acquisition
//!
//! A flyer page is recognized once per configured profile and the longest
//! transcript wins. Dense promotional layouts defeat any single segmentation
//! mode often enough that the extra passes pay off; the longest output is the
//! one that lost the least text.

use image::DynamicImage;
use serde::Serialize;
use std::time::Instant;

use crate::config::AcquisitionConfig;
use crate::engine::{OcrEngine, OcrProfile};

/// Outcome of a single recognition pass
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub profile: String,
    /// Characters returned; `None` when the pass failed
    pub chars: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub time_ms: u64,
}

/// Selected transcript and what each pass produced
#[derive(Debug, Clone, Serialize)]
pub struct AcquiredText {
    #[serde(skip)]
    pub text: String,
    /// Label of the winning profile, if any pass succeeded
    pub selected: Option<String>,
    pub passes: Vec<PassReport>,
}

pub struct TextAcquirer<'a> {
    engine: &'a dyn OcrEngine,
    profiles: &'a [OcrProfile],
}

impl<'a> TextAcquirer<'a> {
    pub fn new(engine: &'a dyn OcrEngine, config: &'a AcquisitionConfig) -> Self {
        Self {
            engine,
            profiles: &config.profiles,
        }
    }

    /// Recognize `image` with every profile and keep the longest result.
    ///
    /// Failed passes are logged and ignored. If every pass fails the text is
    /// empty; this never returns an error.
    pub fn acquire(&self, image: &DynamicImage) -> AcquiredText {
        let mut best: Option<(usize, String, String)> = None;
        let mut passes = Vec::with_capacity(self.profiles.len());

        for profile in self.profiles {
            let label = profile.label();
            let start = Instant::now();
            let result = self.engine.recognize(image, profile);
            let time_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(text) => {
                    let len = text.chars().count();
                    tracing::debug!("{} pass {} returned {} chars", self.engine.name(), label, len);

                    // strictly longer: ties keep the earlier profile
                    if best.as_ref().map_or(true, |(best_len, _, _)| len > *best_len) {
                        best = Some((len, label.clone(), text));
                    }
                    passes.push(PassReport {
                        profile: label,
                        chars: Some(len),
                        error: None,
                        time_ms,
                    });
                }
                Err(e) => {
                    tracing::warn!("{} pass {} failed: {}", self.engine.name(), label, e);
                    passes.push(PassReport {
                        profile: label,
                        chars: None,
                        error: Some(e.to_string()),
                        time_ms,
                    });
                }
            }
        }

        match best {
            Some((_, selected, text)) => AcquiredText {
                text,
                selected: Some(selected),
                passes,
            },
            None => AcquiredText {
                text: String::new(),
                selected: None,
                passes,
            },
        }
    }
}
