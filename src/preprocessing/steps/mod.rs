//! Individual normalization steps

pub mod denoise;
pub mod deskew;
pub mod grayscale;
pub mod orientation;
pub mod resize;
pub mod threshold;

use image::DynamicImage;

use super::pipeline::StageOutcome;

/// Output of one step: the (possibly unchanged) image plus what happened.
pub struct Step {
    pub image: DynamicImage,
    pub outcome: StageOutcome,
}

impl Step {
    pub fn applied(image: DynamicImage) -> Self {
        Self {
            image,
            outcome: StageOutcome::Applied,
        }
    }

    pub fn unchanged(image: DynamicImage) -> Self {
        Self {
            image,
            outcome: StageOutcome::Unchanged,
        }
    }

    pub fn skipped(image: DynamicImage, reason: impl Into<String>) -> Self {
        Self {
            image,
            outcome: StageOutcome::Skipped(reason.into()),
        }
    }
}
