use crate::error::OcrError;
use image::{DynamicImage, GenericImageView};
use serde::Serialize;
use std::time::Instant;

use super::quality::{self, QualityAssessment};
use super::steps;

/// Longest side allowed before recognition
pub const DEFAULT_MAX_DIMENSION: u32 = 2000;

/// Timing information for a single preprocessing step
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Result of preprocessing including timing stats
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessingResult {
    /// Preprocessed image (not serialized)
    #[serde(skip)]
    pub image: DynamicImage,
    pub width: u32,
    pub height: u32,
    /// Total preprocessing time in milliseconds
    pub total_time_ms: u64,
    /// Individual step timings
    pub steps: Vec<StepTiming>,
}

/// Fixed preprocessing pipeline: rescale, grayscale, contrast stretch
///
/// Rescaling runs first so the two full-image passes after it are bounded
/// by `max_dimension`.
#[derive(Debug, Clone, Copy)]
pub struct Pipeline {
    max_dimension: u32,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DIMENSION)
    }
}

impl Pipeline {
    pub fn new(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Produce a recognition-ready copy of `image`
    pub fn run(&self, image: &DynamicImage) -> Result<PreprocessingResult, OcrError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(OcrError::DegenerateInput(format!(
                "cannot preprocess a {}x{} image",
                width, height
            )));
        }

        let start = Instant::now();
        let mut steps_timing = Vec::new();

        let img = self.run_step("resize", &mut steps_timing, || {
            Ok(steps::resize::apply(image, self.max_dimension))
        })?;
        let img = self.run_step("grayscale", &mut steps_timing, || {
            Ok(steps::grayscale::apply(&img))
        })?;
        let img = self.run_step("normalize", &mut steps_timing, || {
            steps::normalize::apply(img)
        })?;

        let total_time_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(
            "Preprocessed {}x{} -> {}x{} in {}ms",
            width,
            height,
            img.width(),
            img.height(),
            total_time_ms
        );

        Ok(PreprocessingResult {
            width: img.width(),
            height: img.height(),
            image: img,
            total_time_ms,
            steps: steps_timing,
        })
    }

    /// Quality gate on the original (unprocessed) image
    pub fn assess(&self, image: &DynamicImage) -> QualityAssessment {
        quality::assess(image)
    }

    fn run_step<F>(
        &self,
        name: &str,
        timings: &mut Vec<StepTiming>,
        step_fn: F,
    ) -> Result<DynamicImage, OcrError>
    where
        F: FnOnce() -> Result<DynamicImage, OcrError>,
    {
        let step_start = Instant::now();
        let result = step_fn()?;
        timings.push(StepTiming {
            name: name.to_string(),
            time_ms: step_start.elapsed().as_millis() as u64,
        });
        Ok(result)
    }
}
