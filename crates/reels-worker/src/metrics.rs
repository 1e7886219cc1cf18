//! Worker metrics. A recorder must be installed by the binary for these to be exported.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const UNITS_PROCESSED_TOTAL: &str = "reels_units_processed_total";
    pub const UNIT_FAILURES_TOTAL: &str = "reels_unit_failures_total";
    pub const RETRIES_TOTAL: &str = "reels_retries_total";
    pub const JOBS_COMPLETED_TOTAL: &str = "reels_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "reels_jobs_failed_total";
    pub const CACHE_HITS_TOTAL: &str = "reels_cache_hits_total";
    pub const CACHE_MISSES_TOTAL: &str = "reels_cache_misses_total";
    pub const JOB_DURATION_SECONDS: &str = "reels_job_duration_seconds";
}

pub fn record_unit_processed(template: &str) {
    let labels = [("template", template.to_string())];
    counter!(names::UNITS_PROCESSED_TOTAL, &labels).increment(1);
}

pub fn record_unit_failure(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::UNIT_FAILURES_TOTAL, &labels).increment(1);
}

pub fn record_retry(operation: &str) {
    // Operation names carry verse numbers; keep only the step
    let step = operation.split_whitespace().next().unwrap_or(operation);
    let labels = [("operation", step.to_string())];
    counter!(names::RETRIES_TOTAL, &labels).increment(1);
}

pub fn record_job_completed(quality: &str, duration_secs: f64) {
    let labels = [("quality", quality.to_string())];
    counter!(names::JOBS_COMPLETED_TOTAL, &labels).increment(1);
    histogram!(names::JOB_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_job_failed(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::JOBS_FAILED_TOTAL, &labels).increment(1);
}

pub fn record_cache_hit() {
    counter!(names::CACHE_HITS_TOTAL).increment(1);
}

pub fn record_cache_miss() {
    counter!(names::CACHE_MISSES_TOTAL).increment(1);
}
