//! Page normalization for OCR
//!
//! Upscale, orientation fix, deskew, denoise and optional binarization, applied
//! in that order. Only an unusable input image is an error; every other stage
//! degrades to a no-op.

pub mod pipeline;
pub mod steps;

pub use pipeline::{NormalizedImage, Normalizer, StageOutcome, StageReport};
