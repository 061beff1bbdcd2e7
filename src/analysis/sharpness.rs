//! Blur scoring from the discrete Laplacian

use crate::preprocessing::steps::grayscale::luminance;
use image::{DynamicImage, GenericImageView, RgbImage};

/// Side of the centered square window that is analysed
const WINDOW_SIZE: u32 = 100;
/// Mean absolute Laplacian that maps to a score of 1.0 (empirical)
const NORMALIZATION: f32 = 50.0;

/// Sharpness of an image in [0, 1]; low values mean blurry or flat
///
/// Only a centered 100x100 window is analysed. The image border is never
/// sampled so the 4-neighbour stencil always stays inside the image.
/// Only the window and its one-pixel halo are converted to RGB.
pub fn score(image: &DynamicImage) -> f32 {
    let (width, height) = image.dimensions();
    if width < 3 || height < 3 {
        return 0.0;
    }

    let (x0, x1) = window_span(width);
    let (y0, y1) = window_span(height);
    let patch = image
        .crop_imm(x0 - 1, y0 - 1, x1 - x0 + 2, y1 - y0 + 2)
        .to_rgb8();

    let mut sum = 0.0f64;
    let mut count = 0u64;
    for y in 1..patch.height() - 1 {
        for x in 1..patch.width() - 1 {
            sum += laplacian(&patch, x, y) as f64;
            count += 1;
        }
    }

    if count == 0 {
        return 0.0;
    }

    let mean = (sum / count as f64) as f32;
    let score = (mean / NORMALIZATION).clamp(0.0, 1.0);
    tracing::debug!("Sharpness: mean |laplacian| {:.2}, score {:.3}", mean, score);
    score
}

/// Centered span of at most WINDOW_SIZE, excluding the outermost pixels
fn window_span(len: u32) -> (u32, u32) {
    let size = WINDOW_SIZE.min(len);
    let start = (len - size) / 2;
    (start.max(1), (start + size).min(len - 1))
}

#[inline]
fn laplacian(img: &RgbImage, x: u32, y: u32) -> f32 {
    let l = |x, y| luminance(img.get_pixel(x, y));
    (4.0 * l(x, y) - l(x, y - 1) - l(x, y + 1) - l(x - 1, y) - l(x + 1, y)).abs()
}
