use crate::error::OcrError;
use serde::Serialize;

/// Stage of a recognition run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionStage {
    Initializing,
    Preprocessing,
    Recognizing,
    Completed,
    Failed,
    Cancelled,
}

impl RecognitionStage {
    /// Terminal stages have no outgoing transition
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Progress snapshot emitted during a recognition run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognitionProgress {
    pub stage: RecognitionStage,
    /// 0-100, non-decreasing within a run until Failed/Cancelled reset it
    pub percent: u8,
    pub message: String,
    pub elapsed_ms: u64,
    pub estimated_remaining_ms: Option<u64>,
}

impl RecognitionProgress {
    pub fn new(stage: RecognitionStage, percent: u8, message: &str, elapsed_ms: u64) -> Self {
        let percent = percent.min(100);
        Self {
            stage,
            percent,
            message: message.to_string(),
            elapsed_ms,
            estimated_remaining_ms: estimate_remaining(percent, elapsed_ms),
        }
    }

    /// Snapshot before a run has started
    pub fn idle() -> Self {
        Self::new(RecognitionStage::Initializing, 0, "Waiting to start", 0)
    }
}

/// Linear extrapolation from the time spent so far
fn estimate_remaining(percent: u8, elapsed_ms: u64) -> Option<u64> {
    if percent == 0 || percent >= 100 {
        return None;
    }
    Some(elapsed_ms * (100 - percent as u64) / percent as u64)
}

/// Text recognized from a document
///
/// Word and character counts are derived from the text on demand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognitionResult {
    text: String,
    confidence: f32,
    processing_time_ms: u64,
    language: String,
}

impl RecognitionResult {
    pub fn new(text: String, confidence: f32, processing_time_ms: u64, language: String) -> Self {
        Self {
            text,
            confidence: confidence.clamp(0.0, 1.0),
            processing_time_ms,
            language,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: String) {
        self.text = text;
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn processing_time_ms(&self) -> u64 {
        self.processing_time_ms
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Number of characters (Unicode scalar values), whitespace included
    pub fn character_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Terminal outcome of a recognition run
#[derive(Debug)]
pub enum RecognitionOutcome {
    Completed(RecognitionResult),
    Failed { error: OcrError, elapsed_ms: u64 },
    Cancelled { elapsed_ms: u64 },
}

impl RecognitionOutcome {
    pub fn stage(&self) -> RecognitionStage {
        match self {
            Self::Completed(_) => RecognitionStage::Completed,
            Self::Failed { .. } => RecognitionStage::Failed,
            Self::Cancelled { .. } => RecognitionStage::Cancelled,
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        match self {
            Self::Completed(result) => result.processing_time_ms(),
            Self::Failed { elapsed_ms, .. } | Self::Cancelled { elapsed_ms } => *elapsed_ms,
        }
    }
}
