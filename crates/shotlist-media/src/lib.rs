#![deny(unreachable_patterns)]
//! External media tool wrappers for shotlist extraction.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and a timeout-aware process runner
//! - Duration probing via FFprobe
//! - Scene-cut detection passes and diagnostic parsing
//! - Midpoint keyframe extraction
//! - Text recognition via Tesseract with per-run sessions
//! - Per-run scratch storage with guaranteed cleanup
//!
//! Every tool sits behind a trait ([`MediaProber`], [`SceneDetector`],
//! [`FrameExtractor`], [`OcrEngine`]) so callers can substitute fakes.

pub mod command;
pub mod error;
pub mod keyframe;
pub mod ocr;
pub mod probe;
pub mod scene;
pub mod scratch;

pub use command::{
    check_ffmpeg, check_ffprobe, check_tesseract, run_tool, CommandOutput, FfmpegCommand,
    FfmpegRunner,
};
pub use error::{MediaError, MediaResult};
pub use keyframe::{
    extract_keyframes, keyframe_timestamp, FfmpegFrameExtractor, FrameExtractor, FrameOptions,
};
pub use ocr::{
    recognize_keyframes, recognize_with_engine, split_ocr_lines, OcrEngine, OcrLimits,
    OcrSession, RecognizedText, TesseractEngine,
};
pub use probe::{probe_video, FfprobeProber, MediaProber, VideoInfo};
pub use scene::{
    clamp_threshold, parse_cut_timestamps, run_detection_pass, DetectionPass,
    FfmpegSceneDetector, SceneDetector,
};
pub use scratch::ScratchDir;
