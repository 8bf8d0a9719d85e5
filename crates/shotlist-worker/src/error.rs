//! Worker error types.

use std::path::PathBuf;
use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Errors that abort a shotlist run.
///
/// Probe, detection, extraction and OCR failures degrade instead of
/// surfacing here; only failures that leave nothing to work with do.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Input video not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Scratch storage unavailable: {0}")]
    ScratchStorage(String),
}

impl WorkerError {
    pub fn scratch_storage(msg: impl Into<String>) -> Self {
        Self::ScratchStorage(msg.into())
    }
}
