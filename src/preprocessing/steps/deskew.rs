use image::{DynamicImage, GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::contrast::otsu_level;

use super::{grayscale, Step};
use crate::config::DeskewConfig;

/// Deskew image by measuring the tilt of text-like connected components
///
/// Each component's minimum-area rectangle gives one angle; the median over
/// all components is the page skew. Output is grayscale, same canvas size,
/// with edge pixels replicated into the corners uncovered by the rotation.
pub fn apply(image: DynamicImage, config: &DeskewConfig) -> Step {
    let gray = grayscale::to_gray(&image);

    let Some(skew) = detect_skew(&gray, config) else {
        return Step::skipped(image, "not enough text-like components");
    };

    if skew.abs() <= config.deadband_degrees {
        return Step::unchanged(image);
    }

    tracing::debug!("Correcting {:.2} degree skew", skew);
    Step::applied(DynamicImage::ImageLuma8(rotate_replicate(&gray, -skew)))
}

/// Median tilt in degrees (positive = clockwise), or `None` when fewer than
/// `min_components` components survive the shape filter.
pub fn detect_skew(gray: &GrayImage, config: &DeskewConfig) -> Option<f32> {
    let mut angles = component_angles(gray, config);
    if angles.len() < config.min_components {
        return None;
    }
    Some(median(&mut angles))
}

fn component_angles(gray: &GrayImage, config: &DeskewConfig) -> Vec<f32> {
    // inverse Otsu: ink becomes foreground
    let level = otsu_level(gray);
    let binary = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y).0[0] > level {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    });

    find_contours::<i32>(&binary)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer))
        .filter_map(|c| {
            let points: Vec<(f32, f32)> = c.points.iter().map(|p| (p.x as f32, p.y as f32)).collect();
            if !is_text_like(&points, config) {
                return None;
            }
            min_area_rect_angle(&points)
        })
        .collect()
}

fn is_text_like(points: &[(f32, f32)], config: &DeskewConfig) -> bool {
    let (min_x, max_x, min_y, max_y) = points.iter().fold(
        (f32::MAX, f32::MIN, f32::MAX, f32::MIN),
        |(a, b, c, d), &(x, y)| (a.min(x), b.max(x), c.min(y), d.max(y)),
    );
    let width = max_x - min_x + 1.0;
    let height = max_y - min_y + 1.0;
    let floor = config.min_component_size as f32;

    if width <= floor || height <= floor {
        return false;
    }
    let aspect = width / height;
    aspect >= config.min_aspect && aspect <= config.max_aspect
}

/// Angle of the minimum-area bounding rectangle, folded into [-45, 45).
fn min_area_rect_angle(points: &[(f32, f32)]) -> Option<f32> {
    let hull = convex_hull(points);
    if hull.len() < 3 {
        return None;
    }

    let n = hull.len();
    let mut best: Option<(f32, f32)> = None;

    for i in 0..n {
        let (x0, y0) = hull[i];
        let (x1, y1) = hull[(i + 1) % n];
        let (ex, ey) = (x1 - x0, y1 - y0);
        let len = (ex * ex + ey * ey).sqrt();
        if len < f32::EPSILON {
            continue;
        }
        let (nx, ny) = (ex / len, ey / len);

        let (mut min_u, mut max_u, mut min_v, mut max_v) = (f32::MAX, f32::MIN, f32::MAX, f32::MIN);
        for &(px, py) in &hull {
            let u = nx * (px - x0) + ny * (py - y0);
            let v = -ny * (px - x0) + nx * (py - y0);
            min_u = min_u.min(u);
            max_u = max_u.max(u);
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }

        let area = (max_u - min_u) * (max_v - min_v);
        if best.map_or(true, |(a, _)| area < a) {
            best = Some((area, ny.atan2(nx).to_degrees()));
        }
    }

    best.map(|(_, angle)| fold_angle(angle))
}

fn fold_angle(degrees: f32) -> f32 {
    let mut a = degrees % 90.0;
    if a < -45.0 {
        a += 90.0;
    } else if a >= 45.0 {
        a -= 90.0;
    }
    a
}

/// Andrew's monotone chain; returns the hull counter-clockwise without repeats.
fn convex_hull(points: &[(f32, f32)]) -> Vec<(f32, f32)> {
    let mut pts = points.to_vec();
    pts.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    });
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let cross = |o: (f32, f32), a: (f32, f32), b: (f32, f32)| {
        (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
    };

    let mut lower: Vec<(f32, f32)> = Vec::new();
    for &p in &pts {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<(f32, f32)> = Vec::new();
    for &p in pts.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

fn median(values: &mut [f32]) -> f32 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Rotate clockwise by `degrees` about the center, keeping the canvas size.
/// Samples outside the source are clamped to the nearest edge pixel.
fn rotate_replicate(img: &GrayImage, degrees: f32) -> GrayImage {
    let (width, height) = img.dimensions();
    let (sin, cos) = degrees.to_radians().sin_cos();
    let cx = (width as f32 - 1.0) / 2.0;
    let cy = (height as f32 - 1.0) / 2.0;
    let max_x = width.saturating_sub(1) as f32;
    let max_y = height.saturating_sub(1) as f32;

    GrayImage::from_fn(width, height, |x, y| {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let sx = (cx + dx * cos + dy * sin).clamp(0.0, max_x);
        let sy = (cy - dx * sin + dy * cos).clamp(0.0, max_y);
        Luma([bilinear(img, sx, sy)])
    })
}

fn bilinear(img: &GrayImage, x: f32, y: f32) -> u8 {
    let (width, height) = img.dimensions();
    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p = |px: u32, py: u32| img.get_pixel(px, py).0[0] as f32;
    let top = p(x0, y0) * (1.0 - fx) + p(x1, y0) * fx;
    let bottom = p(x0, y1) * (1.0 - fx) + p(x1, y1) * fx;
    (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8
}
