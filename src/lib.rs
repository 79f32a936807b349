//! Product extraction from scanned retail price flyers
//!
//! A page goes through four stages: normalization (upscale, orientation,
//! deskew, denoise, binarize), text acquisition (several Tesseract
//! segmentation modes, longest output wins), and structured extraction of
//! name/price/discount records, each classified into a bilingual category.
//! [`orchestrator::Orchestrator`] drives the stages over a whole document.

pub mod acquisition;
pub mod config;
pub mod engine;
pub mod engines;
pub mod error;
pub mod export;
pub mod extract;
pub mod lexicon;
pub mod loader;
pub mod orchestrator;
pub mod preprocessing;
pub mod record;
pub mod server;

pub use config::Config;
pub use engine::{OcrEngine, OcrError, OcrProfile};
pub use error::FlyerError;
pub use extract::Extractor;
pub use lexicon::Lexicon;
pub use orchestrator::{DocumentReport, DocumentResult, Orchestrator, PageStatus};
pub use record::{CategoryLabel, ProductRecord};
