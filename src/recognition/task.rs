//! Recognition on a dedicated blocking worker
//!
//! The orchestrator, and with it the engine handle, moves onto a tokio
//! blocking thread for the duration of a run and is handed back by
//! [`RecognitionTask::join`]. Live-preview analysis never touches it.

use image::DynamicImage;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::cancel::CancellationToken;
use super::orchestrator::{RecognitionOrchestrator, RecognitionRequest};
use super::types::{RecognitionOutcome, RecognitionProgress};
use crate::error::OcrError;

/// Handle to a recognition running in the background
pub struct RecognitionTask {
    cancel: CancellationToken,
    progress: watch::Receiver<RecognitionProgress>,
    handle: JoinHandle<(RecognitionOrchestrator, RecognitionOutcome)>,
}

impl RecognitionTask {
    /// Start a run. Must be called from within a tokio runtime.
    pub fn spawn(
        mut orchestrator: RecognitionOrchestrator,
        image: DynamicImage,
        request: RecognitionRequest,
    ) -> Self {
        let cancel = CancellationToken::new();
        let (tx, progress) = watch::channel(RecognitionProgress::idle());
        let token = cancel.clone();

        let handle = tokio::task::spawn_blocking(move || {
            let outcome = orchestrator.run(image, &request, &token, |snapshot| {
                tracing::debug!(
                    "Recognition {:?} {}%: {}",
                    snapshot.stage,
                    snapshot.percent,
                    snapshot.message
                );
                // Receivers may be gone; the run still completes
                let _ = tx.send(snapshot.clone());
            });
            (orchestrator, outcome)
        });

        Self {
            cancel,
            progress,
            handle,
        }
    }

    /// Request cancellation; honoured at the next checkpoint
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Latest-value progress channel
    pub fn progress(&self) -> watch::Receiver<RecognitionProgress> {
        self.progress.clone()
    }

    /// Wait for the terminal outcome and take the orchestrator back
    pub async fn join(self) -> Result<(RecognitionOrchestrator, RecognitionOutcome), OcrError> {
        self.handle
            .await
            .map_err(|e| OcrError::Internal(format!("Recognition worker failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineOptions, EngineOutput, ProgressFn, RecognitionEngine};
    use crate::preprocessing::Pipeline;
    use crate::recognition::RecognitionStage;
    use image::RgbImage;
    use std::time::Duration;

    /// Engine that reports progress slowly until told to stop
    struct SlowEngine {
        steps: u8,
        delay: Duration,
        cancelled: bool,
    }

    impl RecognitionEngine for SlowEngine {
        fn name(&self) -> &'static str {
            "slow"
        }

        fn is_language_available(&self, _code: &str) -> bool {
            true
        }

        fn initialize(&mut self, _language: &str, _options: &EngineOptions) -> Result<(), OcrError> {
            self.cancelled = false;
            Ok(())
        }

        fn recognize(
            &mut self,
            _image: &DynamicImage,
            progress: &mut ProgressFn<'_>,
        ) -> Result<EngineOutput, OcrError> {
            for i in 1..=self.steps {
                std::thread::sleep(self.delay);
                if progress(i * (100 / self.steps)).is_break() {
                    return Err(OcrError::Cancelled);
                }
            }
            Ok(EngineOutput {
                text: "slow but steady".to_string(),
                confidence: 0.5,
            })
        }

        fn cancel(&mut self) {
            self.cancelled = true;
        }
    }

    fn orchestrator(steps: u8, delay_ms: u64) -> RecognitionOrchestrator {
        RecognitionOrchestrator::new(
            Box::new(SlowEngine {
                steps,
                delay: Duration::from_millis(delay_ms),
                cancelled: false,
            }),
            Pipeline::default(),
        )
    }

    fn image() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::new(32, 32))
    }

    #[tokio::test]
    async fn test_task_completes_and_returns_orchestrator() {
        let task = RecognitionTask::spawn(orchestrator(4, 1), image(), RecognitionRequest::default());
        let progress = task.progress();

        let (orchestrator, outcome) = task.join().await.unwrap();
        match outcome {
            RecognitionOutcome::Completed(result) => assert_eq!(result.word_count(), 3),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(progress.borrow().stage, RecognitionStage::Completed);
        assert_eq!(orchestrator.engine_name(), "slow");
    }

    #[tokio::test]
    async fn test_task_cancel_while_recognizing() {
        let task =
            RecognitionTask::spawn(orchestrator(50, 20), image(), RecognitionRequest::default());
        let mut progress = task.progress();

        loop {
            if progress.borrow_and_update().stage == RecognitionStage::Recognizing {
                break;
            }
            progress.changed().await.unwrap();
        }
        task.cancel();

        let (_, outcome) = task.join().await.unwrap();
        assert!(matches!(outcome, RecognitionOutcome::Cancelled { .. }));
        assert_eq!(progress.borrow().stage, RecognitionStage::Cancelled);
        assert_eq!(progress.borrow().percent, 0);
    }

    #[tokio::test]
    async fn test_timeout_composed_as_cancellation() {
        let task =
            RecognitionTask::spawn(orchestrator(50, 20), image(), RecognitionRequest::default());
        let token = task.cancellation_token();

        let join = task.join();
        tokio::pin!(join);
        let outcome = match tokio::time::timeout(Duration::from_millis(50), &mut join).await {
            Ok(done) => done.unwrap().1,
            Err(_) => {
                token.cancel();
                join.await.unwrap().1
            }
        };
        assert!(matches!(outcome, RecognitionOutcome::Cancelled { .. }));
    }
}
