//! Job payloads carried on the evaluation streams.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stream_worker::StreamJob;
use uuid::Uuid;

/// A trace was created or updated; evaluate the configured rules for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceUpsertJob {
    /// Job identity, stable across retries.
    pub id: Uuid,
    pub trace_id: String,
    pub project_id: Uuid,
    pub retry_count: u32,
    pub enqueued_at: DateTime<Utc>,
}

impl TraceUpsertJob {
    pub fn new(trace_id: impl Into<String>, project_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            trace_id: trace_id.into(),
            project_id,
            retry_count: 0,
            enqueued_at: Utc::now(),
        }
    }

    /// Time spent queued before this processing attempt.
    pub fn queue_wait_ms(&self) -> f64 {
        (Utc::now() - self.enqueued_at).num_milliseconds().max(0) as f64
    }
}

impl StreamJob for TraceUpsertJob {
    fn job_id(&self) -> String {
        self.id.to_string()
    }

    fn retry_count(&self) -> u32 {
        self.retry_count
    }

    fn with_retry(&self) -> Self {
        Self {
            retry_count: self.retry_count + 1,
            ..self.clone()
        }
    }
}

/// One materialized evaluation job, bound to a `job_executions` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalExecutionJob {
    pub id: Uuid,
    pub job_execution_id: Uuid,
    pub project_id: Uuid,
    pub retry_count: u32,
    pub enqueued_at: DateTime<Utc>,
}

impl EvalExecutionJob {
    pub fn new(job_execution_id: Uuid, project_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_execution_id,
            project_id,
            retry_count: 0,
            enqueued_at: Utc::now(),
        }
    }

    pub fn queue_wait_ms(&self) -> f64 {
        (Utc::now() - self.enqueued_at).num_milliseconds().max(0) as f64
    }
}

impl StreamJob for EvalExecutionJob {
    fn job_id(&self) -> String {
        self.id.to_string()
    }

    fn retry_count(&self) -> u32 {
        self.retry_count
    }

    fn with_retry(&self) -> Self {
        Self {
            retry_count: self.retry_count + 1,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_upsert_retry_keeps_identity() {
        let job = TraceUpsertJob::new("trace-1", Uuid::new_v4());
        let retried = job.with_retry();

        assert_eq!(retried.id, job.id);
        assert_eq!(retried.trace_id, "trace-1");
        assert_eq!(retried.retry_count, 1);
        assert_eq!(retried.enqueued_at, job.enqueued_at);
    }

    #[test]
    fn eval_execution_round_trips_through_json() {
        let job = EvalExecutionJob::new(Uuid::new_v4(), Uuid::new_v4());
        let json = serde_json::to_string(&job).unwrap();
        let parsed: EvalExecutionJob = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.id, job.id);
        assert_eq!(parsed.job_execution_id, job.job_execution_id);
        assert_eq!(parsed.project_id, job.project_id);
    }

    #[test]
    fn queue_wait_is_non_negative() {
        let mut job = TraceUpsertJob::new("trace-1", Uuid::new_v4());
        // Clock skew between producer and consumer must not go negative.
        job.enqueued_at = Utc::now() + chrono::Duration::seconds(30);
        assert_eq!(job.queue_wait_ms(), 0.0);
    }
}
