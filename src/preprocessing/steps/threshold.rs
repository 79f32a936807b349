use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::otsu_level;

use super::{grayscale, Step};

/// Global Otsu binarization
///
/// Pixels brighter than the Otsu level become white, the rest black.
pub fn apply(image: DynamicImage) -> Step {
    let gray = grayscale::to_gray(&image);
    Step::applied(DynamicImage::ImageLuma8(otsu_binarize(&gray)))
}

pub fn otsu_binarize(img: &GrayImage) -> GrayImage {
    let level = otsu_level(img);
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        if img.get_pixel(x, y).0[0] > level {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}
