//! Scripted engine
//!
//! Returns preset text instead of recognizing anything, so the acquisition and
//! extraction stages can be exercised without Tesseract installed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::DynamicImage;

use crate::engine::{OcrEngine, OcrError, OcrProfile, PageSegMode, Rotation};

#[derive(Debug, Clone)]
enum Scripted {
    Text(String),
    Fail(String),
}

pub struct FixedTextEngine {
    default_text: Option<String>,
    per_mode: HashMap<u8, Scripted>,
    rotation: Option<Rotation>,
    calls: AtomicUsize,
}

impl FixedTextEngine {
    /// Every profile recognizes `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            default_text: Some(text.into()),
            per_mode: HashMap::new(),
            rotation: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// No profile recognizes anything unless scripted with `with_text`.
    pub fn failing() -> Self {
        Self {
            default_text: None,
            per_mode: HashMap::new(),
            rotation: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Script the output for one segmentation mode.
    pub fn with_text(mut self, mode: PageSegMode, text: impl Into<String>) -> Self {
        self.per_mode.insert(mode.code(), Scripted::Text(text.into()));
        self
    }

    /// Make one segmentation mode fail.
    pub fn with_failure(mut self, mode: PageSegMode, reason: impl Into<String>) -> Self {
        self.per_mode.insert(mode.code(), Scripted::Fail(reason.into()));
        self
    }

    /// Orientation detection reports `rotation`; without this it fails.
    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = Some(rotation);
        self
    }

    /// Number of `recognize` calls served so far.
    pub fn recognize_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl OcrEngine for FixedTextEngine {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn recognize(&self, _image: &DynamicImage, profile: &OcrProfile) -> Result<String, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.per_mode.get(&profile.page_seg_mode.code()) {
            Some(Scripted::Text(text)) => Ok(text.clone()),
            Some(Scripted::Fail(reason)) => Err(OcrError::Failed(reason.clone())),
            None => self
                .default_text
                .clone()
                .ok_or_else(|| OcrError::Failed(format!("no text scripted for {}", profile.label()))),
        }
    }

    fn detect_orientation(&self, _image: &DynamicImage) -> Result<Rotation, OcrError> {
        self.rotation
            .ok_or_else(|| OcrError::NoOrientation("no rotation scripted".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineMode;

    fn blank() -> DynamicImage {
        DynamicImage::ImageLuma8(image::GrayImage::new(4, 4))
    }

    #[test]
    fn test_per_mode_text_overrides_default() {
        let engine = FixedTextEngine::new("default").with_text(PageSegMode::SparseText, "sparse");
        let sparse = OcrProfile::new(EngineMode::Lstm, PageSegMode::SparseText, "ara+eng");
        let block = OcrProfile::new(EngineMode::Lstm, PageSegMode::UniformBlock, "ara+eng");

        assert_eq!(engine.recognize(&blank(), &sparse).unwrap(), "sparse");
        assert_eq!(engine.recognize(&blank(), &block).unwrap(), "default");
        assert_eq!(engine.recognize_calls(), 2);
    }

    #[test]
    fn test_failing_engine_without_script() {
        let engine = FixedTextEngine::failing();
        let profile = OcrProfile::new(EngineMode::Lstm, PageSegMode::Auto, "ara+eng");
        assert!(engine.recognize(&blank(), &profile).is_err());
        assert!(engine.detect_orientation(&blank()).is_err());
    }
}
