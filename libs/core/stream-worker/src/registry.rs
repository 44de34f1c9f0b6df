//! Core abstractions: stream definitions, job payloads, and processors.

use crate::StreamError;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

/// Type-level stream configuration.
///
/// Each queue declares its Redis keys and tuning as constants, so producers
/// and consumers can never disagree on names.
pub trait StreamDef {
    /// Redis stream key.
    const STREAM_NAME: &'static str;

    /// Consumer group name.
    const CONSUMER_GROUP: &'static str;

    /// Dead letter stream key.
    const DLQ_STREAM: &'static str;

    /// Prefix for the domain metrics recorded around this queue
    /// (e.g. `trace_upsert` yields `trace_upsert_queue_length`).
    const METRIC_PREFIX: &'static str;

    /// Maximum stream length before approximate trimming.
    const MAX_LENGTH: i64 = 100_000;

    /// Messages read per `XREADGROUP` call.
    const BATCH_SIZE: usize = 10;

    /// Blocking read timeout in milliseconds.
    const BLOCK_TIMEOUT_MS: u64 = 5_000;

    /// Visibility timeout: idle pending deliveries older than this are
    /// reclaimed from crashed consumers.
    const CLAIM_IDLE_MS: u64 = 30_000;
}

/// A job payload carried on a stream.
pub trait StreamJob: Serialize + DeserializeOwned + Send + Sync + Clone + 'static {
    /// Stable job ID for logging and idempotent consumers.
    fn job_id(&self) -> String;

    /// Number of processing attempts that already failed.
    fn retry_count(&self) -> u32;

    /// Copy of this job with the retry count incremented. Implementations
    /// must keep the job ID unchanged so downstream idempotency holds.
    fn with_retry(&self) -> Self;

    fn exceeded_max_retries(&self, max_retries: u32) -> bool {
        self.retry_count() >= max_retries
    }
}

/// Processes jobs read from a stream.
///
/// Return `Ok(())` to acknowledge the delivery. Errors are categorized via
/// [`StreamError::category`](crate::StreamError::category) to decide between
/// backoff re-queue and the DLQ.
#[async_trait]
pub trait StreamProcessor<J: StreamJob>: Send + Sync {
    async fn process(&self, job: &J) -> Result<(), StreamError>;

    /// Processor name for logging.
    fn name(&self) -> &'static str;

    /// Downstream dependency check for readiness probes.
    async fn health_check(&self) -> Result<bool, StreamError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Clone, Serialize, Deserialize)]
    struct TestJob {
        id: String,
        retry_count: u32,
    }

    impl StreamJob for TestJob {
        fn job_id(&self) -> String {
            self.id.clone()
        }

        fn retry_count(&self) -> u32 {
            self.retry_count
        }

        fn with_retry(&self) -> Self {
            Self {
                id: self.id.clone(),
                retry_count: self.retry_count + 1,
            }
        }
    }

    struct TestStream;

    impl StreamDef for TestStream {
        const STREAM_NAME: &'static str = "test:jobs";
        const CONSUMER_GROUP: &'static str = "test-workers";
        const DLQ_STREAM: &'static str = "test:jobs:dlq";
        const METRIC_PREFIX: &'static str = "test_jobs";
    }

    #[test]
    fn retry_keeps_job_id() {
        let job = TestJob {
            id: "job-1".to_string(),
            retry_count: 0,
        };

        let retried = job.with_retry();
        assert_eq!(retried.job_id(), "job-1");
        assert_eq!(retried.retry_count(), 1);
        assert!(!retried.exceeded_max_retries(3));
        assert!(retried.exceeded_max_retries(1));
    }

    #[test]
    fn stream_def_defaults() {
        assert_eq!(TestStream::STREAM_NAME, "test:jobs");
        assert_eq!(TestStream::MAX_LENGTH, 100_000);
        assert_eq!(TestStream::BATCH_SIZE, 10);
        assert_eq!(TestStream::CLAIM_IDLE_MS, 30_000);
    }
}
