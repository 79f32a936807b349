use image::{DynamicImage, GrayImage, Luma};

use super::{grayscale, Step};
use crate::config::DenoiseConfig;

/// Non-local means denoising
///
/// Each pixel becomes a weighted mean over its search window, weighted by how
/// closely the surrounding template patch matches. Patch distances for one
/// search offset are read from a single integral image, so the cost per pixel
/// does not depend on the template size.
pub fn apply(image: DynamicImage, config: &DenoiseConfig) -> Step {
    let gray = grayscale::to_gray(&image);
    Step::applied(DynamicImage::ImageLuma8(non_local_means(&gray, config)))
}

pub fn non_local_means(img: &GrayImage, config: &DenoiseConfig) -> GrayImage {
    let (width, height) = img.dimensions();
    let (w, h) = (width as usize, height as usize);
    if w == 0 || h == 0 {
        return img.clone();
    }

    let template = config.template_window as usize;
    let half_template = template / 2;
    let half_search = (config.search_window / 2) as isize;
    let pad = half_search as usize + half_template;

    let padded = Padded::new(img, pad);

    // inner region: every pixel whose template fits in the padded buffer
    let inner_w = w + 2 * half_template;
    let inner_h = h + 2 * half_template;
    let stride = inner_w + 1;
    let mut integral = vec![0f64; stride * (inner_h + 1)];

    let area = (template * template) as f64;
    let inv_h2 = 1.0 / (config.h as f64 * config.h as f64);

    let mut weight_sum = vec![0f32; w * h];
    let mut value_sum = vec![0f32; w * h];

    for dy in -half_search..=half_search {
        for dx in -half_search..=half_search {
            for v in 0..inner_h {
                let py = v + half_search as usize;
                let mut row = 0f64;
                for u in 0..inner_w {
                    let px = u + half_search as usize;
                    let a = padded.at(px, py);
                    let b = padded.at(offset(px, dx), offset(py, dy));
                    let d = (a - b) as f64;
                    row += d * d;
                    integral[(v + 1) * stride + u + 1] = integral[v * stride + u + 1] + row;
                }
            }

            for y in 0..h {
                for x in 0..w {
                    let sum = integral[(y + template) * stride + x + template]
                        - integral[y * stride + x + template]
                        - integral[(y + template) * stride + x]
                        + integral[y * stride + x];
                    let weight = (-(sum / area) * inv_h2).exp() as f32;
                    let neighbour = padded.at(offset(x + pad, dx), offset(y + pad, dy));

                    let i = y * w + x;
                    weight_sum[i] += weight;
                    value_sum[i] += weight * neighbour;
                }
            }
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        let i = y as usize * w + x as usize;
        let value = value_sum[i] / weight_sum[i];
        Luma([value.round().clamp(0.0, 255.0) as u8])
    })
}

fn offset(base: usize, delta: isize) -> usize {
    (base as isize + delta) as usize
}

/// Grayscale buffer with `pad` pixels of edge replication on every side.
struct Padded {
    data: Vec<f32>,
    width: usize,
}

impl Padded {
    fn new(img: &GrayImage, pad: usize) -> Self {
        let (w, h) = (img.width() as usize, img.height() as usize);
        let width = w + 2 * pad;
        let height = h + 2 * pad;
        let clamp = |v: usize, len: usize| v.saturating_sub(pad).min(len - 1) as u32;

        let mut data = Vec::with_capacity(width * height);
        for py in 0..height {
            let sy = clamp(py, h);
            for px in 0..width {
                let sx = clamp(px, w);
                data.push(img.get_pixel(sx, sy).0[0] as f32);
            }
        }

        Self { data, width }
    }

    #[inline]
    fn at(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }
}
