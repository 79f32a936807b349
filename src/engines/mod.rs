//! OCR engine implementations
//!
//! The Tesseract engine drives the `tesseract` executable; the fixed engine
//! replays scripted output for tests (`testing` feature outside this crate).

#[cfg(any(test, feature = "testing"))]
pub mod fixed;
pub mod tesseract;

use std::sync::Arc;

use crate::config::Config;
use crate::engine::OcrEngine;

#[cfg(any(test, feature = "testing"))]
pub use fixed::FixedTextEngine;
pub use tesseract::TesseractEngine;

/// Build the production engine for `config`.
pub fn from_config(config: &Config) -> Arc<dyn OcrEngine> {
    let engine = TesseractEngine::new(&config.tesseract_cmd, config.tessdata_path.clone());
    if !engine.is_available() {
        tracing::warn!(
            "'{}' was not found; every page will yield empty text until Tesseract is installed",
            config.tesseract_cmd
        );
    }
    Arc::new(engine)
}
