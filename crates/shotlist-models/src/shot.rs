//! Shots, keyframes and the assembled shotlist.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::text::TextBuckets;

/// Hard maximum number of shots kept per video.
pub const MAX_SHOTS: usize = 220;

/// A video file that has already been materialized locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAsset {
    /// Local file path
    pub path: PathBuf,
    /// Probed duration in seconds, `None` if probing failed
    pub duration: Option<f64>,
}

impl VideoAsset {
    pub fn new(path: impl Into<PathBuf>, duration: Option<f64>) -> Self {
        Self {
            path: path.into(),
            duration,
        }
    }

    /// Duration in seconds, zero when unknown.
    pub fn duration_or_zero(&self) -> f64 {
        self.duration.unwrap_or(0.0)
    }
}

/// A contiguous span of the video between two boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShotInterval {
    /// 1-based shot index
    pub index: usize,
    /// Start time in seconds
    pub start_sec: f64,
    /// End time in seconds
    pub end_sec: f64,
}

impl ShotInterval {
    pub fn new(index: usize, start_sec: f64, end_sec: f64) -> Self {
        Self {
            index,
            start_sec,
            end_sec,
        }
    }

    /// Length of the interval in seconds.
    pub fn duration(&self) -> f64 {
        (self.end_sec - self.start_sec).max(0.0)
    }
}

/// Representative still for one shot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyframe {
    pub shot_index: usize,
    /// Encoded image bytes, `None` when extraction failed
    pub image: Option<Vec<u8>>,
    /// Location of the still inside the run's scratch directory
    pub path: Option<PathBuf>,
}

impl Keyframe {
    /// A keyframe whose extraction failed.
    pub fn missing(shot_index: usize) -> Self {
        Self {
            shot_index,
            image: None,
            path: None,
        }
    }

    pub fn is_present(&self) -> bool {
        self.image.is_some()
    }
}

/// One entry of the shotlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShotEntry {
    /// 1-based shot index
    pub index: usize,
    /// Timecode of the shot start (HH:MM:SS:FF)
    pub tc_in: String,
    /// Timecode of the shot end (HH:MM:SS:FF)
    pub tc_out: String,
    /// Recognized text lines
    #[serde(default)]
    pub text: Vec<String>,
    /// Base64-encoded JPEG still
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub still: Option<String>,
}

/// Result of one shotlist extraction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShotlistResult {
    /// Probed duration in seconds (0 when unknown)
    pub duration_seconds: f64,
    /// Detection threshold that produced the cuts
    pub used_threshold: f64,
    pub shots: Vec<ShotEntry>,
    pub text_buckets: TextBuckets,
}

impl ShotlistResult {
    /// Number of shots in the result.
    pub fn shot_count(&self) -> usize {
        self.shots.len()
    }

    /// Find a shot by its index.
    pub fn shot(&self, index: usize) -> Option<&ShotEntry> {
        self.shots.iter().find(|s| s.index == index)
    }
}
