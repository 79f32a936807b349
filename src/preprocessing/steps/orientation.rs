use image::DynamicImage;

use super::Step;
use crate::engine::{OcrEngine, Rotation};

/// Fix quadrant rotations reported by the engine's orientation detection
///
/// Quarter turns swap the canvas axes, so nothing is cropped. A detection
/// failure (engine error, too little text) leaves the page as it is.
pub fn apply(image: DynamicImage, engine: &dyn OcrEngine) -> Step {
    match engine.detect_orientation(&image) {
        Ok(Rotation::None) => Step::unchanged(image),
        Ok(rotation) => {
            tracing::debug!("Rotating page {} degrees clockwise", rotation.degrees());
            Step::applied(rotate(image, rotation))
        }
        Err(e) => Step::skipped(image, e.to_string()),
    }
}

/// Rotate clockwise by `rotation`.
pub fn rotate(image: DynamicImage, rotation: Rotation) -> DynamicImage {
    match rotation {
        Rotation::None => image,
        Rotation::Clockwise90 => image.rotate90(),
        Rotation::Rotate180 => image.rotate180(),
        Rotation::Clockwise270 => image.rotate270(),
    }
}
