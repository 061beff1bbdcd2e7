//! Document photo analysis and recognition orchestration
//!
//! Turns camera frames and gallery images into recognition-ready bitmaps:
//! stride-safe frame sampling, lighting and blur scoring, document edge
//! detection, rescale/grayscale/contrast preprocessing, and a cancellable
//! state machine driving an external text-recognition engine.

pub mod analysis;
pub mod config;
pub mod engine;
pub mod engines;
pub mod error;
pub mod frame;
pub mod preprocessing;
pub mod preview;
pub mod recognition;

pub use analysis::{DocumentCorners, EdgeDetector, LightingCondition, Point};
pub use config::Config;
pub use engine::{EngineOptions, EngineOutput, RecognitionEngine};
pub use error::OcrError;
pub use frame::PlanarLuminanceView;
pub use preprocessing::{Pipeline, QualityAssessment};
pub use preview::{FrameGate, PreviewAnalyzer, PreviewListener};
pub use recognition::{
    CancellationToken, RecognitionOrchestrator, RecognitionOutcome, RecognitionProgress,
    RecognitionRequest, RecognitionResult, RecognitionStage, RecognitionTask,
};
