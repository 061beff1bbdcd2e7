use crate::error::OcrError;
use image::{DynamicImage, Rgb, RgbImage};

/// Normalize image contrast using histogram stretching
///
/// Maps the observed luminance range onto 0-255. Input must already be
/// grayscale: the red channel is read as the luminance value. A flat image
/// is returned unchanged.
pub fn apply(image: DynamicImage) -> Result<DynamicImage, OcrError> {
    let rgb = image.to_rgb8();
    let (min_val, max_val) = find_min_max(&rgb).ok_or_else(|| {
        OcrError::DegenerateInput("cannot stretch contrast of an empty image".to_string())
    })?;

    // Avoid division by zero
    if max_val == min_val {
        tracing::debug!("Contrast stretch skipped: flat image at {}", min_val);
        return Ok(image);
    }

    let range = (max_val - min_val) as f32;
    let stretched = RgbImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let v = rgb.get_pixel(x, y).0[0];
        let s = ((v - min_val) as f32 * 255.0 / range)
            .round()
            .clamp(0.0, 255.0) as u8;
        Rgb([s, s, s])
    });

    Ok(DynamicImage::ImageRgb8(stretched))
}

fn find_min_max(img: &RgbImage) -> Option<(u8, u8)> {
    img.pixels().map(|p| p.0[0]).fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((min, max)) => Some((min.min(v), max.max(v))),
    })
}
