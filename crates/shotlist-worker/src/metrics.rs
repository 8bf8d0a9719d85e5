//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; without an installed recorder the
//! calls are no-ops.

use metrics::{counter, histogram};

/// Metric names.
pub mod names {
    pub const RUNS_TOTAL: &str = "shotlist_runs_total";
    pub const RUNS_FAILED_TOTAL: &str = "shotlist_runs_failed_total";
    pub const RUN_DURATION_SECONDS: &str = "shotlist_run_duration_seconds";
    pub const DETECTION_ATTEMPTS_TOTAL: &str = "shotlist_detection_attempts_total";
    pub const SHOTS_PER_RUN: &str = "shotlist_shots_per_run";
    pub const EXTRACTION_FAILURES_TOTAL: &str = "shotlist_extraction_failures_total";
    pub const TEXT_LINES_TOTAL: &str = "shotlist_text_lines_total";
    pub const OCR_FAILURES_TOTAL: &str = "shotlist_ocr_failures_total";
}

/// Record a finished run.
pub fn record_run_completed(duration_secs: f64, shots: usize) {
    counter!(names::RUNS_TOTAL, "status" => "ok").increment(1);
    histogram!(names::RUN_DURATION_SECONDS).record(duration_secs);
    histogram!(names::SHOTS_PER_RUN).record(shots as f64);
}

/// Record a run that aborted.
pub fn record_run_failed(reason: &str) {
    counter!(names::RUNS_TOTAL, "status" => "failed").increment(1);
    let labels = [("reason", reason.to_string())];
    counter!(names::RUNS_FAILED_TOTAL, &labels).increment(1);
}

/// Record the number of detection passes a run needed.
pub fn record_detection_attempts(attempts: usize) {
    counter!(names::DETECTION_ATTEMPTS_TOTAL).increment(attempts as u64);
}

/// Record keyframes whose extraction failed.
pub fn record_extraction_failures(count: usize) {
    if count > 0 {
        counter!(names::EXTRACTION_FAILURES_TOTAL).increment(count as u64);
    }
}

/// Record lines recognized across a run's keyframes.
pub fn record_text_lines(count: usize) {
    counter!(names::TEXT_LINES_TOTAL).increment(count as u64);
}

/// Record keyframes whose text recognition failed.
pub fn record_ocr_failures(count: usize) {
    if count > 0 {
        counter!(names::OCR_FAILURES_TOTAL).increment(count as u64);
    }
}
