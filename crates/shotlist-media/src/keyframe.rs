//! Keyframe extraction: one representative still per shot.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::path::Path;
use tokio::fs;
use tracing::{debug, warn};

use shotlist_models::{Keyframe, ShotInterval};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::scratch::ScratchDir;

/// Default transport width of extracted stills.
pub const DEFAULT_STILL_WIDTH: u32 = 360;

/// Minimum offset into a shot used when sampling its keyframe.
const MIN_KEYFRAME_OFFSET: f64 = 0.01;

/// Options for a single frame extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOptions {
    /// Output width in pixels; height follows the aspect ratio
    pub width: u32,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_STILL_WIDTH,
        }
    }
}

/// Extracts a single frame from a video.
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    /// Write the frame at `at_seconds` of `path` to `out_path`.
    async fn extract_frame(
        &self,
        path: &Path,
        at_seconds: f64,
        out_path: &Path,
        opts: FrameOptions,
    ) -> MediaResult<()>;
}

/// [`FrameExtractor`] backed by the `ffmpeg` binary.
#[derive(Debug, Clone, Default)]
pub struct FfmpegFrameExtractor {
    runner: FfmpegRunner,
}

impl FfmpegFrameExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-frame timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.runner = self.runner.with_timeout(secs);
        self
    }

    /// Build the FFmpeg command for one still.
    pub fn build_command(
        path: &Path,
        at_seconds: f64,
        out_path: &Path,
        opts: FrameOptions,
    ) -> FfmpegCommand {
        // -2 keeps the aspect ratio with an even height
        FfmpegCommand::new(path, out_path)
            .seek(at_seconds)
            .single_frame()
            .video_filter(format!("scale={}:-2", opts.width))
            .log_level("error")
    }
}

#[async_trait]
impl FrameExtractor for FfmpegFrameExtractor {
    async fn extract_frame(
        &self,
        path: &Path,
        at_seconds: f64,
        out_path: &Path,
        opts: FrameOptions,
    ) -> MediaResult<()> {
        let cmd = Self::build_command(path, at_seconds, out_path, opts);
        self.runner.run(&cmd).await?;
        Ok(())
    }
}

/// Timestamp sampled for a shot's keyframe: its midpoint, never closer than
/// 10ms to the shot start.
pub fn keyframe_timestamp(interval: &ShotInterval) -> f64 {
    let half = (interval.end_sec - interval.start_sec) / 2.0;
    interval.start_sec + half.max(MIN_KEYFRAME_OFFSET)
}

/// Extract one keyframe per interval.
///
/// Up to `parallelism` extractions run at once; the output is in interval
/// order. A failed extraction yields a keyframe without an image.
pub async fn extract_keyframes(
    extractor: &dyn FrameExtractor,
    path: &Path,
    intervals: &[ShotInterval],
    scratch: &ScratchDir,
    opts: FrameOptions,
    parallelism: usize,
) -> Vec<Keyframe> {
    // Build every future before streaming: a closure over borrowed items in
    // the stream makes the caller's future non-Send.
    let jobs: Vec<_> = intervals
        .iter()
        .copied()
        .map(|interval| extract_keyframe(extractor, path, interval, scratch, opts))
        .collect();

    stream::iter(jobs)
        .buffered(parallelism.max(1))
        .collect()
        .await
}

async fn extract_keyframe(
    extractor: &dyn FrameExtractor,
    path: &Path,
    interval: ShotInterval,
    scratch: &ScratchDir,
    opts: FrameOptions,
) -> Keyframe {
    let at = keyframe_timestamp(&interval);
    let out_path = scratch.still_path(interval.index);

    let result = async {
        extractor.extract_frame(path, at, &out_path, opts).await?;
        let bytes = fs::read(&out_path).await?;
        if bytes.is_empty() {
            return Err(MediaError::ffmpeg_failed("Extracted still is empty", None, None));
        }
        Ok::<_, MediaError>(bytes)
    }
    .await;

    match result {
        Ok(bytes) => {
            debug!(shot = interval.index, at, bytes = bytes.len(), "Extracted keyframe");
            Keyframe {
                shot_index: interval.index,
                image: Some(bytes),
                path: Some(out_path),
            }
        }
        Err(e) => {
            warn!(shot = interval.index, at, error = %e, "Keyframe extraction failed");
            Keyframe::missing(interval.index)
        }
    }
}
