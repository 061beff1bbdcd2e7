//! Recognition state machine
//!
//! ```text
//! Initializing -> Preprocessing -> Recognizing -> Completed
//!       |               |               |
//!       +---------------+---------------+--> Failed | Cancelled
//! ```
//!
//! Cancellation is checked on entry to every stage and on every progress
//! report from the engine. Percentages only grow during a run; the Failed
//! and Cancelled snapshots report 0.

use std::ops::ControlFlow;
use std::time::Instant;

use image::DynamicImage;

use super::cancel::CancellationToken;
use super::types::{RecognitionOutcome, RecognitionProgress, RecognitionResult, RecognitionStage};
use crate::config::Config;
use crate::engine::{EngineOptions, RecognitionEngine};
use crate::error::OcrError;
use crate::preprocessing::Pipeline;

const INIT_DONE: u8 = 10;
const PREPROCESS_DONE: u8 = 20;
/// Engine progress is mapped onto PREPROCESS_DONE..=RECOGNIZE_CAP
const RECOGNIZE_CAP: u8 = 99;

/// Parameters of a single recognition run
#[derive(Debug, Clone)]
pub struct RecognitionRequest {
    pub language: String,
    /// Run the preprocessing pipeline before recognition
    pub preprocess: bool,
    pub engine_options: EngineOptions,
}

impl Default for RecognitionRequest {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            preprocess: true,
            engine_options: EngineOptions::default(),
        }
    }
}

impl From<&Config> for RecognitionRequest {
    fn from(config: &Config) -> Self {
        Self {
            language: config.default_language.clone(),
            preprocess: config.preprocess,
            engine_options: EngineOptions {
                lines_per_progress_step: config.lines_per_progress_step,
            },
        }
    }
}

/// Owns the engine handle and sequences one recognition at a time
pub struct RecognitionOrchestrator {
    engine: Box<dyn RecognitionEngine>,
    pipeline: Pipeline,
}

/// Emits snapshots and keeps `percent` monotonic
struct ProgressTracker<'a> {
    start: Instant,
    last_percent: u8,
    sink: &'a mut dyn FnMut(&RecognitionProgress),
}

impl<'a> ProgressTracker<'a> {
    fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn emit(&mut self, stage: RecognitionStage, percent: u8, message: &str) {
        self.last_percent = self.last_percent.max(percent.min(100));
        let snapshot =
            RecognitionProgress::new(stage, self.last_percent, message, self.elapsed_ms());
        (self.sink)(&snapshot);
    }

    /// Failed/Cancelled snapshots reset the percentage
    fn emit_reset(&mut self, stage: RecognitionStage, message: &str) {
        let snapshot = RecognitionProgress::new(stage, 0, message, self.elapsed_ms());
        (self.sink)(&snapshot);
    }
}

impl RecognitionOrchestrator {
    pub fn new(engine: Box<dyn RecognitionEngine>, pipeline: Pipeline) -> Self {
        Self { engine, pipeline }
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Run the full state machine once and return its terminal outcome
    ///
    /// `on_progress` is called synchronously for every snapshot, ending with
    /// exactly one terminal snapshot.
    pub fn run<F>(
        &mut self,
        image: DynamicImage,
        request: &RecognitionRequest,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> RecognitionOutcome
    where
        F: FnMut(&RecognitionProgress),
    {
        let mut tracker = ProgressTracker {
            start: Instant::now(),
            last_percent: 0,
            sink: &mut on_progress,
        };

        let result = self.drive(image, request, cancel, &mut tracker);
        let elapsed_ms = tracker.elapsed_ms();

        match result {
            Ok(result) => {
                tracing::info!(
                    "Recognition completed in {}ms, confidence: {:.2}, words: {}",
                    elapsed_ms,
                    result.confidence(),
                    result.word_count()
                );
                tracker.emit(RecognitionStage::Completed, 100, "Recognition complete");
                RecognitionOutcome::Completed(result)
            }
            Err(e) if matches!(e, OcrError::Cancelled) || cancel.is_cancelled() => {
                // Release engine resources before reporting
                self.engine.cancel();
                tracing::info!("Recognition cancelled after {}ms", elapsed_ms);
                tracker.emit_reset(RecognitionStage::Cancelled, "Recognition cancelled");
                RecognitionOutcome::Cancelled { elapsed_ms }
            }
            Err(error) => {
                tracing::warn!("Recognition failed after {}ms: {}", elapsed_ms, error);
                tracker.emit_reset(RecognitionStage::Failed, &error.to_string());
                RecognitionOutcome::Failed { error, elapsed_ms }
            }
        }
    }

    fn drive(
        &mut self,
        image: DynamicImage,
        request: &RecognitionRequest,
        cancel: &CancellationToken,
        tracker: &mut ProgressTracker<'_>,
    ) -> Result<RecognitionResult, OcrError> {
        // Initializing
        tracker.emit(
            RecognitionStage::Initializing,
            0,
            "Loading language data...",
        );
        cancel.checkpoint()?;
        if !self.engine.is_language_available(&request.language) {
            return Err(OcrError::LanguageUnavailable(format!(
                "{} has no data for '{}'",
                self.engine.name(),
                request.language
            )));
        }
        self.engine
            .initialize(&request.language, &request.engine_options)?;
        tracker.emit(RecognitionStage::Initializing, INIT_DONE, "Engine ready");

        // Preprocessing
        cancel.checkpoint()?;
        tracker.emit(
            RecognitionStage::Preprocessing,
            INIT_DONE,
            "Preprocessing image...",
        );
        let image = if request.preprocess {
            match self.pipeline.run(&image) {
                Ok(prepared) => prepared.image,
                Err(e) => {
                    tracing::warn!("Preprocessing failed, recognizing original image: {}", e);
                    image
                }
            }
        } else {
            image
        };
        tracker.emit(
            RecognitionStage::Preprocessing,
            PREPROCESS_DONE,
            "Preprocessing complete",
        );

        // Recognizing
        cancel.checkpoint()?;
        tracker.emit(
            RecognitionStage::Recognizing,
            PREPROCESS_DONE,
            "Recognizing text...",
        );
        let output = {
            let mut on_engine_progress = |engine_percent: u8| {
                if cancel.is_cancelled() {
                    return ControlFlow::Break(());
                }
                let span = (RECOGNIZE_CAP - PREPROCESS_DONE) as u32;
                let percent = PREPROCESS_DONE as u32 + engine_percent.min(100) as u32 * span / 100;
                tracker.emit(
                    RecognitionStage::Recognizing,
                    percent as u8,
                    "Recognizing text...",
                );
                ControlFlow::Continue(())
            };
            self.engine.recognize(&image, &mut on_engine_progress)
        };
        cancel.checkpoint()?;
        let output = output?;

        tracker.emit(RecognitionStage::Recognizing, 100, "Finalizing results...");

        Ok(RecognitionResult::new(
            output.text,
            output.confidence,
            tracker.elapsed_ms(),
            request.language.clone(),
        ))
    }
}
