use crate::error::OcrError;
use image::DynamicImage;
use std::ops::ControlFlow;

/// Raw output of a recognition engine
#[derive(Debug, Clone)]
pub struct EngineOutput {
    pub text: String,
    /// Engine confidence in [0, 1]
    pub confidence: f32,
}

/// Engine-specific initialization options
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Text lines recognized between two progress reports (pump-able engines)
    pub lines_per_progress_step: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            lines_per_progress_step: 4,
        }
    }
}

/// Progress sink handed to [`RecognitionEngine::recognize`]
///
/// Receives engine-local percentages (0-100). Returning `Break` asks the
/// engine to stop at its next opportunity and return [`OcrError::Cancelled`].
pub type ProgressFn<'a> = dyn FnMut(u8) -> ControlFlow<()> + 'a;

/// Black-box text recognizer driven by the orchestrator
///
/// Handles are not assumed reentrant: every method takes `&mut self`, so at
/// most one call is in flight per engine instance.
pub trait RecognitionEngine: Send {
    /// Returns the engine identifier (e.g., "ocrs", "tesseract")
    fn name(&self) -> &'static str;

    /// Whether language data for `code` is installed
    fn is_language_available(&self, code: &str) -> bool;

    /// Load and validate the language data
    fn initialize(&mut self, language: &str, options: &EngineOptions) -> Result<(), OcrError>;

    /// Recognize the text in `image`
    fn recognize(
        &mut self,
        image: &DynamicImage,
        progress: &mut ProgressFn<'_>,
    ) -> Result<EngineOutput, OcrError>;

    /// Abort work and release resources held for the current run
    fn cancel(&mut self);
}
