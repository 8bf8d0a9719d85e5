//! Shared data models for shotlist extraction.
//!
//! This crate provides Serde-serializable types for:
//! - Shot intervals and keyframes
//! - On-screen text lines and their semantic buckets
//! - The caller-facing shotlist result and its post-filter
//! - Fixed-frame-rate timecodes

pub mod filter;
pub mod shot;
pub mod text;
pub mod timecode;

// Re-export common types
pub use filter::ShotlistFilter;
pub use shot::{Keyframe, ShotEntry, ShotInterval, ShotlistResult, VideoAsset, MAX_SHOTS};
pub use text::{TextBucket, TextBuckets, TextLine, UnknownBucket, DEFAULT_BUCKET_CAP};
pub use timecode::{from_timecode, to_timecode, TimecodeError, DEFAULT_FPS};
