//! Post-capture quality gate

use crate::analysis::{brightness, sharpness};
use image::{DynamicImage, GenericImageView};
use serde::Serialize;

const VERY_BLURRY: f32 = 0.3;
const SLIGHTLY_BLURRY: f32 = 0.6;
const TOO_DARK: f32 = 0.3;
const OVEREXPOSED: f32 = 0.9;
const MIN_RESOLUTION: u64 = 500_000;

const MIN_ACCEPTABLE_BRIGHTNESS: f32 = 0.2;
const MAX_ACCEPTABLE_BRIGHTNESS: f32 = 0.95;

/// Usability verdict for a captured image
///
/// Warnings are advisory. Only `acceptable == false` should prompt the user
/// to retake the picture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityAssessment {
    pub acceptable: bool,
    pub blur_score: f32,
    pub brightness_score: f32,
    pub resolution_pixels: u64,
    pub warnings: Vec<String>,
}

impl QualityAssessment {
    /// Apply the warning and acceptance rules to precomputed scores
    pub fn from_scores(blur_score: f32, brightness_score: f32, resolution_pixels: u64) -> Self {
        let mut warnings = Vec::new();

        if resolution_pixels == 0 {
            warnings.push("image is empty".to_string());
        }
        if blur_score < VERY_BLURRY {
            warnings.push("very blurry".to_string());
        } else if blur_score < SLIGHTLY_BLURRY {
            warnings.push("slightly blurry".to_string());
        }
        if brightness_score < TOO_DARK {
            warnings.push("too dark".to_string());
        } else if brightness_score > OVEREXPOSED {
            warnings.push("overexposed".to_string());
        }
        if resolution_pixels < MIN_RESOLUTION {
            warnings.push("low resolution".to_string());
        }

        let acceptable = resolution_pixels > 0
            && blur_score >= VERY_BLURRY
            && (MIN_ACCEPTABLE_BRIGHTNESS..=MAX_ACCEPTABLE_BRIGHTNESS).contains(&brightness_score);

        Self {
            acceptable,
            blur_score,
            brightness_score,
            resolution_pixels,
            warnings,
        }
    }
}

/// Score blur and brightness of `image` independently and derive warnings
pub fn assess(image: &DynamicImage) -> QualityAssessment {
    let (width, height) = image.dimensions();
    let resolution_pixels = width as u64 * height as u64;

    let blur_score = sharpness::score(image);
    let brightness_score = brightness::score(image);
    let assessment = QualityAssessment::from_scores(blur_score, brightness_score, resolution_pixels);

    tracing::debug!(
        "Quality: acceptable={}, blur={:.3}, brightness={:.3}, pixels={}, warnings={:?}",
        assessment.acceptable,
        blur_score,
        brightness_score,
        resolution_pixels,
        assessment.warnings
    );

    assessment
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_blurry_is_never_acceptable() {
        for brightness in [0.0, 0.2, 0.5, 0.95, 1.0] {
            let q = QualityAssessment::from_scores(0.29, brightness, 12_000_000);
            assert!(!q.acceptable, "brightness {}", brightness);
            assert!(q.warnings.contains(&"very blurry".to_string()));
        }
    }

    #[test]
    fn test_warning_rules() {
        let q = QualityAssessment::from_scores(0.45, 0.1, 2_000_000);
        assert_eq!(q.warnings, ["slightly blurry", "too dark"]);
        assert!(!q.acceptable);

        let q = QualityAssessment::from_scores(0.8, 0.93, 2_000_000);
        assert_eq!(q.warnings, ["overexposed"]);
        assert!(q.acceptable);
    }

    #[test]
    fn test_low_resolution_still_acceptable() {
        let q = QualityAssessment::from_scores(0.7, 0.5, 300_000);
        assert_eq!(q.warnings, ["low resolution"]);
        assert!(q.acceptable);
    }

    #[test]
    fn test_brightness_bounds_are_inclusive() {
        assert!(QualityAssessment::from_scores(0.5, 0.2, 1_000_000).acceptable);
        assert!(QualityAssessment::from_scores(0.5, 0.95, 1_000_000).acceptable);
        assert!(!QualityAssessment::from_scores(0.5, 0.19, 1_000_000).acceptable);
        assert!(!QualityAssessment::from_scores(0.5, 0.96, 1_000_000).acceptable);
    }

    #[test]
    fn test_assess_flat_gray_image() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(800, 700, Rgb([128, 128, 128])));
        let q = assess(&img);
        assert!(!q.acceptable);
        assert_eq!(q.resolution_pixels, 560_000);
        assert!(q.blur_score < 0.3);
        assert!((q.brightness_score - 128.0 / 255.0).abs() < 0.01);
        assert_eq!(q.warnings, ["very blurry"]);
    }

    #[test]
    fn test_assess_sharp_document() {
        let img = RgbImage::from_fn(1000, 800, |x, y| {
            if (x / 3 + y / 3) % 2 == 0 {
                Rgb([40, 40, 40])
            } else {
                Rgb([220, 220, 220])
            }
        });
        let q = assess(&DynamicImage::ImageRgb8(img));
        assert!(q.acceptable, "{:?}", q);
        assert!(q.warnings.is_empty(), "{:?}", q.warnings);
    }

    #[test]
    fn test_assess_empty_image() {
        let q = assess(&DynamicImage::ImageRgb8(RgbImage::new(0, 0)));
        assert!(!q.acceptable);
        assert_eq!(q.warnings.first().map(String::as_str), Some("image is empty"));
    }
}
