use image::{imageops::FilterType, DynamicImage, GenericImageView};

use super::Step;

/// Upscale pages that are too small for reliable recognition
///
/// Scales isotropically by the larger of the two ratios needed to reach the
/// minimum on each short axis. Never shrinks.
pub fn apply(image: DynamicImage, min_width: u32, min_height: u32) -> Step {
    let (width, height) = image.dimensions();

    let Some(scale) = upscale_factor(width, height, min_width, min_height) else {
        return Step::unchanged(image);
    };

    let new_width = scaled(width, scale);
    let new_height = scaled(height, scale);

    tracing::debug!(
        "Upscaling {}x{} -> {}x{} (x{:.3})",
        width,
        height,
        new_width,
        new_height,
        scale
    );

    Step::applied(image.resize_exact(new_width, new_height, FilterType::CatmullRom))
}

fn upscale_factor(width: u32, height: u32, min_width: u32, min_height: u32) -> Option<f64> {
    if width >= min_width && height >= min_height {
        return None;
    }

    let scale_w = if width < min_width {
        min_width as f64 / width as f64
    } else {
        1.0
    };
    let scale_h = if height < min_height {
        min_height as f64 / height as f64
    } else {
        1.0
    };

    Some(scale_w.max(scale_h))
}

/// Round up so float error can't leave an axis one pixel short of the minimum.
fn scaled(len: u32, scale: f64) -> u32 {
    let target = len as f64 * scale;
    let rounded = target.round();
    if (target - rounded).abs() < 1e-6 {
        rounded as u32
    } else {
        target.ceil() as u32
    }
}
