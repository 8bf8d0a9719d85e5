//! Adaptive scene-cut detection.
//!
//! The requested sensitivity rarely suits every piece of footage, so
//! detection walks a ladder of progressively more sensitive thresholds and
//! stops at the first pass that finds enough candidates. When no pass does,
//! the pass with the most candidates wins and ties go to the earliest rung.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use shotlist_media::scene::{clamp_threshold, run_detection_pass, DetectionPass, SceneDetector};
use shotlist_media::ScratchDir;

/// Thresholds closer than this are considered the same rung.
const THRESHOLD_EPSILON: f64 = 1e-6;

/// Relative step applied to the requested threshold for the second rung.
const RELAXED_FACTOR: f64 = 0.75;

/// Ordered list of thresholds to try.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdLadder {
    thresholds: Vec<f64>,
}

impl ThresholdLadder {
    /// Build `[requested, 0.75 x requested, fallbacks...]`.
    ///
    /// Every entry is clamped to the accepted threshold range, entries equal
    /// to an earlier one are dropped and the list is truncated to
    /// `max_attempts` (at least one).
    pub fn build(requested: f64, fallbacks: &[f64], max_attempts: usize) -> Self {
        let candidates = [requested, requested * RELAXED_FACTOR]
            .into_iter()
            .chain(fallbacks.iter().copied())
            .map(clamp_threshold);

        let mut thresholds: Vec<f64> = Vec::new();
        for t in candidates {
            if !thresholds
                .iter()
                .any(|existing| (existing - t).abs() < THRESHOLD_EPSILON)
            {
                thresholds.push(t);
            }
        }
        thresholds.truncate(max_attempts.max(1));

        Self { thresholds }
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    pub fn first(&self) -> f64 {
        self.thresholds[0]
    }

    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }
}

/// Whether a pass found enough candidates to stop searching.
pub fn is_sufficient(candidates: usize, min_cuts: usize) -> bool {
    candidates >= min_cuts
}

/// Result of the threshold search.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveOutcome {
    /// Threshold of the selected pass
    pub used_threshold: f64,
    /// Candidate cuts of the selected pass, sorted ascending
    pub cuts: Vec<f64>,
    /// Frames the selected pass extracted
    pub frame_count: usize,
    /// Passes run
    pub attempts: usize,
}

/// Runs detection passes down a [`ThresholdLadder`].
#[derive(Clone)]
pub struct AdaptiveDetector {
    detector: Arc<dyn SceneDetector>,
    min_cuts: usize,
}

impl AdaptiveDetector {
    pub fn new(detector: Arc<dyn SceneDetector>, min_cuts: usize) -> Self {
        Self { detector, min_cuts }
    }

    /// Search the ladder for a pass with enough candidates.
    ///
    /// Frames left by the previous pass are cleared from the scratch cuts
    /// directory before each pass.
    pub async fn detect(
        &self,
        path: &Path,
        ladder: &ThresholdLadder,
        scratch: &ScratchDir,
    ) -> AdaptiveOutcome {
        let mut best: Option<DetectionPass> = None;
        let mut attempts = 0;

        for &threshold in ladder.thresholds() {
            if let Err(e) = scratch.clear_cut_frames().await {
                warn!(error = %e, "Failed to clear frames of previous detection pass");
            }

            attempts += 1;
            let pass =
                run_detection_pass(self.detector.as_ref(), path, threshold, scratch.cuts_dir())
                    .await;
            let count = pass.candidate_count();
            debug!(threshold, count, attempt = attempts, "Detection pass");

            let sufficient = is_sufficient(count, self.min_cuts);
            let better = best
                .as_ref()
                .map_or(true, |b| count > b.candidate_count());
            if better {
                best = Some(pass);
            }

            if sufficient {
                break;
            }
        }

        let best = best.unwrap_or_else(|| DetectionPass::empty(ladder.first()));

        info!(
            used_threshold = best.threshold,
            cuts = best.candidate_count(),
            attempts,
            "Adaptive detection finished"
        );

        AdaptiveOutcome {
            used_threshold: best.threshold,
            frame_count: best.frames.len(),
            cuts: best.cuts,
            attempts,
        }
    }
}
