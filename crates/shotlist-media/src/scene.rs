//! Scene boundary detection using FFmpeg's scene-difference metric.
//!
//! One detection pass runs the `select='gt(scene,T)',showinfo` filter graph:
//! every frame whose scene score exceeds `T` is written to the output
//! directory as a numbered JPEG and `showinfo` logs a diagnostic line with
//! its `pts_time`. The timestamps are scraped from that diagnostic text.
//!
//! Parsing is kept separate from process execution so the
//! [`SceneDetector`] seam can be replaced by a fake in tests.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Most sensitive threshold accepted.
pub const MIN_THRESHOLD: f64 = 0.05;
/// Least sensitive threshold accepted.
pub const MAX_THRESHOLD: f64 = 0.95;

/// File name prefix of frames emitted by a detection pass.
pub const CUT_FRAME_PREFIX: &str = "cut_";

/// Clamp a sensitivity threshold into [`MIN_THRESHOLD`, `MAX_THRESHOLD`].
pub fn clamp_threshold(threshold: f64) -> f64 {
    if threshold.is_nan() {
        return MIN_THRESHOLD;
    }
    threshold.clamp(MIN_THRESHOLD, MAX_THRESHOLD)
}

/// Runs a single scene-cut detection pass.
#[async_trait]
pub trait SceneDetector: Send + Sync {
    /// Detect cuts in `path` at `threshold`, writing one numbered frame per
    /// cut into `out_dir`. Returns the diagnostic text embedding each cut's
    /// timestamp.
    async fn detect_scene_cuts(
        &self,
        path: &Path,
        threshold: f64,
        out_dir: &Path,
    ) -> MediaResult<String>;
}

/// [`SceneDetector`] backed by the `ffmpeg` binary.
#[derive(Debug, Clone, Default)]
pub struct FfmpegSceneDetector {
    runner: FfmpegRunner,
}

impl FfmpegSceneDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-pass timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.runner = self.runner.with_timeout(secs);
        self
    }

    /// Build the FFmpeg command for one pass.
    pub fn build_command(path: &Path, threshold: f64, out_dir: &Path) -> FfmpegCommand {
        let pattern = out_dir.join(format!("{}%05d.jpg", CUT_FRAME_PREFIX));
        FfmpegCommand::new(path, pattern)
            // showinfo writes at info level
            .log_level("info")
            .video_filter(scene_filter(threshold))
            .variable_frame_sync()
    }
}

#[async_trait]
impl SceneDetector for FfmpegSceneDetector {
    async fn detect_scene_cuts(
        &self,
        path: &Path,
        threshold: f64,
        out_dir: &Path,
    ) -> MediaResult<String> {
        let cmd = Self::build_command(path, threshold, out_dir);
        let output = self.runner.run(&cmd).await?;
        Ok(output.stderr)
    }
}

/// Filter graph selecting frames whose scene score exceeds `threshold`.
pub fn scene_filter(threshold: f64) -> String {
    format!("select='gt(scene,{:.4})',showinfo", clamp_threshold(threshold))
}

/// Extract cut timestamps from `showinfo` diagnostic text.
///
/// Every `pts_time:<seconds>` token is collected; non-finite and negative
/// values are discarded. The result is sorted ascending and deduplicated at
/// millisecond resolution.
pub fn parse_cut_timestamps(diagnostic: &str) -> Vec<f64> {
    let mut times: Vec<f64> = diagnostic
        .lines()
        .filter_map(|line| line.split("pts_time:").nth(1))
        .filter_map(|rest| {
            let rest = rest.trim_start();
            let end = rest
                .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == 'e' || c == '+'))
                .unwrap_or(rest.len());
            rest[..end].parse::<f64>().ok()
        })
        .filter(|t| t.is_finite() && *t >= 0.0)
        .map(|t| (t * 1000.0).round() / 1000.0)
        .collect();

    times.sort_by(|a, b| a.total_cmp(b));
    times.dedup();
    times
}

/// List frames a detection pass wrote to `out_dir`, in detection order.
pub async fn list_cut_frames(out_dir: &Path) -> MediaResult<Vec<PathBuf>> {
    let mut frames = Vec::new();
    let mut entries = fs::read_dir(out_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(CUT_FRAME_PREFIX) && name.ends_with(".jpg") {
            frames.push(entry.path());
        }
    }
    // Frame numbers are zero padded, so lexical order is emission order
    frames.sort();
    Ok(frames)
}

/// Outcome of one detection pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionPass {
    /// Threshold the pass ran at
    pub threshold: f64,
    /// Sorted, deduplicated candidate cut timestamps
    pub cuts: Vec<f64>,
    /// Frames extracted by the pass, in detection order
    pub frames: Vec<PathBuf>,
}

impl DetectionPass {
    /// A pass that produced no candidates.
    pub fn empty(threshold: f64) -> Self {
        Self {
            threshold,
            cuts: Vec::new(),
            frames: Vec::new(),
        }
    }

    pub fn candidate_count(&self) -> usize {
        self.cuts.len()
    }
}

/// Run one detection pass, treating any failure as zero candidates.
pub async fn run_detection_pass(
    detector: &dyn SceneDetector,
    path: &Path,
    threshold: f64,
    out_dir: &Path,
) -> DetectionPass {
    let threshold = clamp_threshold(threshold);

    let diagnostic = match detector.detect_scene_cuts(path, threshold, out_dir).await {
        Ok(text) => text,
        Err(e) => {
            warn!(threshold, error = %e, "Scene detection pass failed, treating as no cuts");
            return DetectionPass::empty(threshold);
        }
    };

    let cuts = parse_cut_timestamps(&diagnostic);
    let frames = match list_cut_frames(out_dir).await {
        Ok(frames) => frames,
        Err(e) => {
            warn!(dir = %out_dir.display(), error = %e, "Failed to list detected frames");
            Vec::new()
        }
    };

    debug!(
        threshold,
        candidates = cuts.len(),
        frames = frames.len(),
        "Scene detection pass finished"
    );

    DetectionPass {
        threshold,
        cuts,
        frames,
    }
}
