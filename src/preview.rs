//! Live-preview frame analysis with drop-not-queue backpressure
//!
//! While one frame is being analysed every other submitted frame is
//! dropped. The in-flight flag is released by a guard, so a failed or
//! panicking analysis never blocks later frames.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::analysis::brightness::{self, LightingCondition, DEFAULT_SAMPLE_STEP};
use crate::analysis::edges::{DocumentCorners, EdgeDetector};
use crate::frame::PlanarLuminanceView;

/// Receives the per-frame analysis results
pub trait PreviewListener {
    fn on_lighting(&self, condition: LightingCondition);

    fn on_corners(&self, corners: Option<DocumentCorners>);
}

/// Admits at most one frame at a time
#[derive(Debug, Clone, Default)]
pub struct FrameGate {
    in_flight: Arc<AtomicBool>,
}

/// Proof that the holder owns the gate; releases it on drop
#[derive(Debug)]
pub struct FramePermit {
    in_flight: Arc<AtomicBool>,
}

impl Drop for FramePermit {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}

impl FrameGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` when another frame is still being analysed
    pub fn try_enter(&self) -> Option<FramePermit> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FramePermit {
                in_flight: Arc::clone(&self.in_flight),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Per-frame lighting and document-edge analysis
#[derive(Debug, Clone)]
pub struct PreviewAnalyzer {
    gate: FrameGate,
    detector: EdgeDetector,
    sample_step: usize,
    detect_edges: bool,
}

impl Default for PreviewAnalyzer {
    fn default() -> Self {
        Self::new(EdgeDetector::default(), DEFAULT_SAMPLE_STEP, true)
    }
}

impl PreviewAnalyzer {
    pub fn new(detector: EdgeDetector, sample_step: usize, detect_edges: bool) -> Self {
        Self {
            gate: FrameGate::new(),
            detector,
            sample_step,
            detect_edges,
        }
    }

    /// Gate shared by every clone of this analyzer
    pub fn gate(&self) -> &FrameGate {
        &self.gate
    }

    /// Analyse a frame unless another one is in flight
    ///
    /// Returns `false` if the frame was dropped.
    pub fn submit(&self, view: &PlanarLuminanceView<'_>, listener: &dyn PreviewListener) -> bool {
        let Some(_permit) = self.gate.try_enter() else {
            tracing::trace!("Preview frame dropped, analysis in flight");
            return false;
        };

        listener.on_lighting(brightness::detect(view, self.sample_step));
        if self.detect_edges {
            listener.on_corners(self.detector.detect(view));
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder {
        lighting: Mutex<Vec<LightingCondition>>,
        corners: Mutex<Vec<Option<DocumentCorners>>>,
    }

    impl PreviewListener for Recorder {
        fn on_lighting(&self, condition: LightingCondition) {
            self.lighting.lock().unwrap().push(condition);
        }

        fn on_corners(&self, corners: Option<DocumentCorners>) {
            self.corners.lock().unwrap().push(corners);
        }
    }

    #[test]
    fn test_permit_releases_gate() {
        let gate = FrameGate::new();
        let permit = gate.try_enter().unwrap();
        assert!(gate.is_busy());
        assert!(gate.try_enter().is_none());
        drop(permit);
        assert!(!gate.is_busy());
        assert!(gate.try_enter().is_some());
    }

    #[test]
    fn test_gate_released_after_panic() {
        let gate = FrameGate::new();
        let inner = gate.clone();
        let result = std::panic::catch_unwind(move || {
            let _permit = inner.try_enter().unwrap();
            panic!("analysis blew up");
        });
        assert!(result.is_err());
        assert!(!gate.is_busy());
    }

    #[test]
    fn test_submit_reports_lighting_and_corners() {
        let frame = GrayImage::from_pixel(320, 240, Luma([20]));
        let analyzer = PreviewAnalyzer::default();
        let recorder = Recorder::default();

        assert!(analyzer.submit(&PlanarLuminanceView::from_gray(&frame), &recorder));
        assert_eq!(*recorder.lighting.lock().unwrap(), [LightingCondition::VeryLow]);
        assert_eq!(*recorder.corners.lock().unwrap(), [None]);
    }

    #[test]
    fn test_frames_dropped_while_busy() {
        let frame = GrayImage::from_pixel(64, 64, Luma([200]));
        let analyzer = PreviewAnalyzer::default();
        let recorder = Recorder::default();

        let held = analyzer.gate().try_enter().unwrap();
        for _ in 0..3 {
            assert!(!analyzer.submit(&PlanarLuminanceView::from_gray(&frame), &recorder));
        }
        drop(held);
        assert!(analyzer.submit(&PlanarLuminanceView::from_gray(&frame), &recorder));

        assert_eq!(recorder.lighting.lock().unwrap().len(), 1);
    }

    /// Tracks how many analyses run at once
    #[derive(Default)]
    struct InFlightCounter {
        current: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    impl PreviewListener for InFlightCounter {
        fn on_lighting(&self, _condition: LightingCondition) {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(2));
        }

        fn on_corners(&self, _corners: Option<DocumentCorners>) {
            self.current.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_concurrent_submitters_never_overlap() {
        let analyzer = Arc::new(PreviewAnalyzer::new(EdgeDetector::default(), 1, true));
        let frame = Arc::new(GrayImage::from_pixel(400, 400, Luma([128])));
        let counter = Arc::new(InFlightCounter::default());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let analyzer = Arc::clone(&analyzer);
                let frame = Arc::clone(&frame);
                let counter = Arc::clone(&counter);
                std::thread::spawn(move || {
                    (0..20)
                        .filter(|_| {
                            analyzer.submit(&PlanarLuminanceView::from_gray(&frame), &*counter)
                        })
                        .count()
                })
            })
            .collect();

        let processed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert!(processed >= 1);
        assert_eq!(counter.calls.load(Ordering::SeqCst), processed);
        assert_eq!(counter.peak.load(Ordering::SeqCst), 1);
        assert_eq!(counter.current.load(Ordering::SeqCst), 0);
        assert!(!analyzer.gate().is_busy());
    }
}
