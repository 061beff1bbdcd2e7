//! Image preprocessing ahead of text recognition
//!
//! Rescale, grayscale and contrast-stretch captured images, and assess
//! whether an input is usable at all.

pub mod pipeline;
pub mod quality;
pub mod steps;

pub use pipeline::{Pipeline, PreprocessingResult, StepTiming, DEFAULT_MAX_DIMENSION};
pub use quality::{assess, QualityAssessment};
