use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Sample ({x}, {y}) out of bounds: offset {offset} (capacity: {capacity} bytes)")]
    OutOfBounds {
        x: usize,
        y: usize,
        offset: usize,
        capacity: usize,
    },

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Failed to initialize recognition engine: {0}")]
    InitializationError(String),

    #[error("Language data not available: {0}")]
    LanguageUnavailable(String),

    #[error("Recognition engine error: {0}")]
    EngineError(String),

    #[error("Preprocessing failed: {0}")]
    PreprocessingError(String),

    #[error("Failed to read or write image: {0}")]
    ImageIo(String),

    #[error("Recognition cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OcrError {
    /// Stable machine-readable code, used in CLI output
    pub fn code(&self) -> &'static str {
        match self {
            OcrError::OutOfBounds { .. } => "OUT_OF_BOUNDS",
            OcrError::DegenerateInput(_) => "DEGENERATE_INPUT",
            OcrError::InitializationError(_) => "INIT_ERROR",
            OcrError::LanguageUnavailable(_) => "LANGUAGE_UNAVAILABLE",
            OcrError::EngineError(_) => "ENGINE_ERROR",
            OcrError::PreprocessingError(_) => "PREPROCESSING_ERROR",
            OcrError::ImageIo(_) => "IMAGE_IO",
            OcrError::Cancelled => "CANCELLED",
            OcrError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
