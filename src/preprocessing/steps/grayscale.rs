use image::{DynamicImage, Rgb, RgbImage};

/// ITU-R BT.601 luma weights
const RED_WEIGHT: f32 = 0.299;
const GREEN_WEIGHT: f32 = 0.587;
const BLUE_WEIGHT: f32 = 0.114;

/// Weighted luminance of an RGB sample, on the 0-255 scale
#[inline]
pub fn luminance(pixel: &Rgb<u8>) -> f32 {
    let [r, g, b] = pixel.0;
    RED_WEIGHT * r as f32 + GREEN_WEIGHT * g as f32 + BLUE_WEIGHT * b as f32
}

/// Convert image to grayscale
///
/// The luminance is replicated into all three channels so later steps can
/// keep working on an RGB buffer. Always returns a new image of the same
/// dimensions.
pub fn apply(image: &DynamicImage) -> DynamicImage {
    let rgb = image.to_rgb8();
    let gray = RgbImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let l = luminance(rgb.get_pixel(x, y)).round().clamp(0.0, 255.0) as u8;
        Rgb([l, l, l])
    });
    DynamicImage::ImageRgb8(gray)
}
