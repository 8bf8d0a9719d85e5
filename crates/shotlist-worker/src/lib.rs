//! Shotlist extraction pipeline.
//!
//! This crate provides:
//! - Adaptive scene-cut detection over a threshold ladder
//! - Shot interval construction
//! - Classification of recognized text into semantic buckets
//! - The pipeline orchestrator tying the media backends together
//! - Configuration, structured run logging and metrics

pub mod adaptive;
pub mod classify;
pub mod config;
pub mod error;
pub mod intervals;
pub mod logging;
pub mod metrics;
pub mod pipeline;

pub use adaptive::{is_sufficient, AdaptiveDetector, AdaptiveOutcome, ThresholdLadder};
pub use classify::{classify_line, clean_line, TextBucketer};
pub use config::ShotlistConfig;
pub use error::{WorkerError, WorkerResult};
pub use intervals::build_shot_intervals;
pub use logging::RunLogger;
pub use pipeline::{ShotlistBackends, ShotlistPipeline, ShotlistRequest};
