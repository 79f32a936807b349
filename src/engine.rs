use image::DynamicImage;
use serde::Serialize;
use thiserror::Error;

/// Errors raised by an OCR backend. Callers in the core treat all of them as
/// recoverable: a failed profile is dropped, a failed orientation query is a no-op.
#[derive(Error, Debug)]
pub enum OcrError {
    #[error("OCR engine not available: {0}")]
    Unavailable(String),

    #[error("OCR failed: {0}")]
    Failed(String),

    #[error("Orientation could not be determined: {0}")]
    NoOrientation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Recognition engine mode (Tesseract `--oem`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineMode {
    Legacy,
    Lstm,
    Combined,
    Default,
}

impl EngineMode {
    pub fn code(&self) -> u8 {
        match self {
            Self::Legacy => 0,
            Self::Lstm => 1,
            Self::Combined => 2,
            Self::Default => 3,
        }
    }
}

/// Page segmentation assumption (Tesseract `--psm`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSegMode {
    /// Fully automatic page segmentation
    Auto,
    /// Single column of text of variable sizes
    SingleColumn,
    /// Single uniform block of text
    UniformBlock,
    /// As much text as possible in no particular order
    SparseText,
}

impl PageSegMode {
    pub fn code(&self) -> u8 {
        match self {
            Self::Auto => 3,
            Self::SingleColumn => 4,
            Self::UniformBlock => 6,
            Self::SparseText => 11,
        }
    }
}

/// One recognition configuration: engine mode, segmentation mode and language set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OcrProfile {
    pub engine_mode: EngineMode,
    pub page_seg_mode: PageSegMode,
    /// Tesseract language set, e.g. `ara+eng`
    pub languages: String,
}

impl OcrProfile {
    pub fn new(engine_mode: EngineMode, page_seg_mode: PageSegMode, languages: &str) -> Self {
        Self {
            engine_mode,
            page_seg_mode,
            languages: languages.to_string(),
        }
    }

    /// Short label used in logs and reports, e.g. `oem1/psm6/ara+eng`
    pub fn label(&self) -> String {
        format!(
            "oem{}/psm{}/{}",
            self.engine_mode.code(),
            self.page_seg_mode.code(),
            self.languages
        )
    }
}

/// Quadrant rotation reported by orientation detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Rotation {
    None,
    Clockwise90,
    Rotate180,
    Clockwise270,
}

impl Rotation {
    /// Map a rotation in degrees to a quadrant. Only exact multiples of 90 are accepted.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Self::None),
            90 => Some(Self::Clockwise90),
            180 => Some(Self::Rotate180),
            270 => Some(Self::Clockwise270),
            _ => None,
        }
    }

    pub fn degrees(&self) -> u32 {
        match self {
            Self::None => 0,
            Self::Clockwise90 => 90,
            Self::Rotate180 => 180,
            Self::Clockwise270 => 270,
        }
    }
}

/// Trait every OCR backend implements.
///
/// Engines are stateless between calls; the same engine is shared across page
/// workers, so implementations must be `Send + Sync`.
pub trait OcrEngine: Send + Sync {
    /// Returns the engine identifier (e.g., "tesseract")
    fn name(&self) -> &'static str;

    /// Recognize text in `image` under `profile`.
    fn recognize(&self, image: &DynamicImage, profile: &OcrProfile) -> Result<String, OcrError>;

    /// Orientation/script detection: the clockwise rotation that makes the page upright.
    fn detect_orientation(&self, image: &DynamicImage) -> Result<Rotation, OcrError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_from_degrees() {
        assert_eq!(Rotation::from_degrees(0), Some(Rotation::None));
        assert_eq!(Rotation::from_degrees(90), Some(Rotation::Clockwise90));
        assert_eq!(Rotation::from_degrees(-90), Some(Rotation::Clockwise270));
        assert_eq!(Rotation::from_degrees(450), Some(Rotation::Clockwise90));
        assert_eq!(Rotation::from_degrees(45), None);
    }

    #[test]
    fn test_profile_label() {
        let profile = OcrProfile::new(EngineMode::Lstm, PageSegMode::SparseText, "ara+eng");
        assert_eq!(profile.label(), "oem1/psm11/ara+eng");
    }
}
