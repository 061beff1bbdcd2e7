//! Brightness scoring for live-preview hints and post-capture quality checks

use crate::error::OcrError;
use crate::frame::PlanarLuminanceView;
use crate::preprocessing::steps::grayscale::luminance;
use image::{DynamicImage, GenericImageView, Pixel};
use serde::Serialize;

/// Grid spacing used by [`detect`] when the caller has no preference
pub const DEFAULT_SAMPLE_STEP: usize = 8;

/// Pixel spacing (both axes) used by [`score`]
const SCORE_SAMPLE_STEP: u32 = 10;

const VERY_LOW_THRESHOLD: f32 = 30.0;
const LOW_THRESHOLD: f32 = 60.0;

/// Lighting classification surfaced to the live preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LightingCondition {
    Good,
    Low,
    VeryLow,
}

impl LightingCondition {
    pub fn from_mean_luminance(mean: f32) -> Self {
        if mean < VERY_LOW_THRESHOLD {
            Self::VeryLow
        } else if mean < LOW_THRESHOLD {
            Self::Low
        } else {
            Self::Good
        }
    }

    /// Whether the preview should show a lighting hint
    pub fn needs_warning(&self) -> bool {
        !matches!(self, Self::Good)
    }
}

/// Classify the lighting of a camera frame
///
/// Samples on a `sample_step` grid instead of every pixel. Never fails:
/// empty frames and unreadable samples classify as `Good` so a malformed
/// frame does not raise a false alarm.
pub fn detect(view: &PlanarLuminanceView<'_>, sample_step: usize) -> LightingCondition {
    match mean_luminance(view, sample_step) {
        Ok(Some(mean)) => LightingCondition::from_mean_luminance(mean),
        Ok(None) => {
            tracing::debug!("No luminance samples in frame, assuming good lighting");
            LightingCondition::Good
        }
        Err(e) => {
            tracing::warn!("Lighting detection failed, assuming good lighting: {}", e);
            LightingCondition::Good
        }
    }
}

/// Mean sampled luminance (0-255), `None` when no sample was taken
pub fn mean_luminance(
    view: &PlanarLuminanceView<'_>,
    sample_step: usize,
) -> Result<Option<f32>, OcrError> {
    let step = sample_step.max(1);
    let mut total = 0u64;
    let mut count = 0u64;

    for y in (0..view.height()).step_by(step) {
        for x in (0..view.width()).step_by(step) {
            total += view.sample(x, y)? as u64;
            count += 1;
        }
    }

    Ok((count > 0).then(|| total as f32 / count as f32))
}

/// Brightness of a decoded image in [0, 1]
///
/// Averages the BT.601 luminance of every 10th pixel in both axes.
/// An empty image scores 0. Pixels are read in place; only the samples
/// are converted.
pub fn score(image: &DynamicImage) -> f32 {
    let (width, height) = image.dimensions();
    let mut total = 0.0f64;
    let mut count = 0u64;

    for y in (0..height).step_by(SCORE_SAMPLE_STEP as usize) {
        for x in (0..width).step_by(SCORE_SAMPLE_STEP as usize) {
            total += luminance(&image.get_pixel(x, y).to_rgb()) as f64;
            count += 1;
        }
    }

    if count == 0 {
        return 0.0;
    }

    ((total / count as f64) / 255.0).clamp(0.0, 1.0) as f32
}
