//! Recognition orchestration around an external engine

pub mod cancel;
pub mod orchestrator;
pub mod task;
pub mod types;

pub use cancel::CancellationToken;
pub use orchestrator::{RecognitionOrchestrator, RecognitionRequest};
pub use task::RecognitionTask;
pub use types::{RecognitionOutcome, RecognitionProgress, RecognitionResult, RecognitionStage};
