//! Pipeline configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use shotlist_media::keyframe::DEFAULT_STILL_WIDTH;
use shotlist_media::ocr::{
    DEFAULT_LANGUAGE, DEFAULT_MAX_LINES, DEFAULT_MIN_LINE_LEN, DEFAULT_PAGE_SEG_MODE,
};
use shotlist_models::{DEFAULT_BUCKET_CAP, DEFAULT_FPS, MAX_SHOTS};

/// Shotlist pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShotlistConfig {
    /// Directory under which per-run scratch directories are created
    pub work_dir: PathBuf,
    /// Sensitivity used when a request does not supply one
    pub default_sensitivity: f64,
    /// Candidate count at which the threshold search stops early
    pub min_cuts: usize,
    /// Maximum detection passes per run
    pub max_attempts: usize,
    /// Fixed thresholds tried after the requested one
    pub fallback_thresholds: Vec<f64>,
    /// Hard cap on shots per video
    pub max_shots: usize,
    /// Maximum entries per text bucket
    pub bucket_cap: usize,
    /// Still width in pixels
    pub still_width: u32,
    /// Assumed frame rate for timecodes
    pub fps: u32,
    /// Maximum OCR lines kept per shot
    pub max_ocr_lines: usize,
    /// Minimum characters per OCR line
    pub min_line_len: usize,
    /// Lines longer than this are classified as titles
    pub title_max_len: usize,
    /// Concurrent keyframe extractions
    pub extract_parallelism: usize,
    /// Tesseract language
    pub ocr_language: String,
    /// Tesseract page segmentation mode
    pub ocr_page_seg_mode: u8,
    /// Timeout for ffprobe (seconds)
    pub probe_timeout_secs: u64,
    /// Timeout for one scene detection pass (seconds)
    pub detect_timeout_secs: u64,
    /// Timeout for one still extraction (seconds)
    pub extract_timeout_secs: u64,
    /// Timeout for OCR of one frame (seconds)
    pub ocr_timeout_secs: u64,
}

impl Default for ShotlistConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir().join("shotlist"),
            default_sensitivity: 0.35,
            min_cuts: 8,
            max_attempts: 6,
            fallback_thresholds: vec![0.20, 0.15, 0.12, 0.10],
            max_shots: MAX_SHOTS,
            bucket_cap: DEFAULT_BUCKET_CAP,
            still_width: DEFAULT_STILL_WIDTH,
            fps: DEFAULT_FPS,
            max_ocr_lines: DEFAULT_MAX_LINES,
            min_line_len: DEFAULT_MIN_LINE_LEN,
            title_max_len: 45,
            extract_parallelism: 4,
            ocr_language: DEFAULT_LANGUAGE.to_string(),
            ocr_page_seg_mode: DEFAULT_PAGE_SEG_MODE,
            probe_timeout_secs: 30,
            detect_timeout_secs: 600,
            extract_timeout_secs: 60,
            ocr_timeout_secs: 30,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

impl ShotlistConfig {
    /// Create config from `SHOTLIST_*` environment variables, falling back
    /// to defaults for anything missing or unparsable.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            work_dir: std::env::var("SHOTLIST_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(d.work_dir),
            default_sensitivity: env_parse("SHOTLIST_SENSITIVITY")
                .unwrap_or(d.default_sensitivity),
            min_cuts: env_parse("SHOTLIST_MIN_CUTS").unwrap_or(d.min_cuts),
            max_attempts: env_parse("SHOTLIST_MAX_ATTEMPTS").unwrap_or(d.max_attempts),
            fallback_thresholds: std::env::var("SHOTLIST_FALLBACK_THRESHOLDS")
                .ok()
                .and_then(|s| parse_threshold_list(&s))
                .unwrap_or(d.fallback_thresholds),
            max_shots: env_parse("SHOTLIST_MAX_SHOTS").unwrap_or(d.max_shots),
            bucket_cap: env_parse("SHOTLIST_BUCKET_CAP").unwrap_or(d.bucket_cap),
            still_width: env_parse("SHOTLIST_STILL_WIDTH").unwrap_or(d.still_width),
            fps: env_parse("SHOTLIST_FPS")
                .filter(|fps: &u32| *fps > 0)
                .unwrap_or(d.fps),
            max_ocr_lines: env_parse("SHOTLIST_MAX_OCR_LINES").unwrap_or(d.max_ocr_lines),
            min_line_len: env_parse("SHOTLIST_MIN_LINE_LEN").unwrap_or(d.min_line_len),
            title_max_len: env_parse("SHOTLIST_TITLE_MAX_LEN").unwrap_or(d.title_max_len),
            extract_parallelism: env_parse("SHOTLIST_EXTRACT_PARALLELISM")
                .unwrap_or(d.extract_parallelism),
            ocr_language: std::env::var("SHOTLIST_OCR_LANGUAGE").unwrap_or(d.ocr_language),
            ocr_page_seg_mode: env_parse("SHOTLIST_OCR_PSM").unwrap_or(d.ocr_page_seg_mode),
            probe_timeout_secs: env_parse("SHOTLIST_PROBE_TIMEOUT_SECS")
                .unwrap_or(d.probe_timeout_secs),
            detect_timeout_secs: env_parse("SHOTLIST_DETECT_TIMEOUT_SECS")
                .unwrap_or(d.detect_timeout_secs),
            extract_timeout_secs: env_parse("SHOTLIST_EXTRACT_TIMEOUT_SECS")
                .unwrap_or(d.extract_timeout_secs),
            ocr_timeout_secs: env_parse("SHOTLIST_OCR_TIMEOUT_SECS")
                .unwrap_or(d.ocr_timeout_secs),
        }
    }

    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    pub fn with_min_cuts(mut self, min_cuts: usize) -> Self {
        self.min_cuts = min_cuts;
        self
    }

    pub fn with_max_shots(mut self, max_shots: usize) -> Self {
        self.max_shots = max_shots;
        self
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps.max(1);
        self
    }

    pub fn with_bucket_cap(mut self, cap: usize) -> Self {
        self.bucket_cap = cap;
        self
    }
}

/// Parse a comma-separated threshold list. Returns `None` if any entry is
/// not a number or the list is empty.
fn parse_threshold_list(s: &str) -> Option<Vec<f64>> {
    let values: Option<Vec<f64>> = s
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.parse().ok())
        .collect();
    values.filter(|v| !v.is_empty())
}
