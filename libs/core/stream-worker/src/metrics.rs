//! Framework-level worker metrics.
//!
//! Domain metrics (`trace_upsert_queue_*`, `eval_execution_queue_*`) are
//! recorded by the processors; these are the generic per-stream counters
//! every worker emits.

use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Metric names shared across workers.
pub mod names {
    pub const JOBS_PROCESSED: &str = "stream_jobs_processed_total";
    pub const JOB_DURATION: &str = "stream_job_processing_duration_seconds";
    pub const RETRIES: &str = "stream_retries_total";
    pub const IN_FLIGHT: &str = "stream_in_flight_jobs";
}

/// Terminal outcome of one delivery attempt.
#[derive(Debug, Clone, Copy)]
pub enum JobStatus {
    Success,
    Failed,
    Dlq,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Dlq => "dlq",
        }
    }
}

pub fn record_job_processed(stream: &str, status: JobStatus) {
    counter!(
        names::JOBS_PROCESSED,
        "stream" => stream.to_string(),
        "status" => status.as_str()
    )
    .increment(1);
}

pub fn record_job_duration(stream: &str, duration: Duration) {
    histogram!(
        names::JOB_DURATION,
        "stream" => stream.to_string()
    )
    .record(duration.as_secs_f64());
}

pub fn record_retry(stream: &str, attempt: u32) {
    counter!(
        names::RETRIES,
        "stream" => stream.to_string(),
        "attempt" => attempt.to_string()
    )
    .increment(1);
}

pub fn set_in_flight(stream: &str, count: f64) {
    gauge!(
        names::IN_FLIGHT,
        "stream" => stream.to_string()
    )
    .set(count);
}

/// Queue depth gauge under the stream's domain metric prefix
/// (e.g. `trace_upsert_queue_length`).
pub fn set_queue_length(metric_prefix: &str, length: f64) {
    gauge!(format!("{metric_prefix}_queue_length")).set(length);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_status_labels() {
        assert_eq!(JobStatus::Success.as_str(), "success");
        assert_eq!(JobStatus::Failed.as_str(), "failed");
        assert_eq!(JobStatus::Dlq.as_str(), "dlq");
    }
}
