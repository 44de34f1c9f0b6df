//! Worker configuration.

use crate::registry::StreamDef;
use uuid::Uuid;

/// Runtime configuration for a [`StreamWorker`](crate::StreamWorker).
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Redis stream key.
    pub stream_name: String,

    /// Consumer group name.
    pub consumer_group: String,

    /// Unique consumer ID within the group.
    pub consumer_id: String,

    /// Dead letter stream key.
    pub dlq_stream: String,

    /// Prefix for domain metrics around this queue.
    pub metric_prefix: String,

    /// Maximum stream length before approximate trimming.
    pub max_length: i64,

    /// Messages read per batch.
    pub batch_size: usize,

    /// Blocking read timeout; `None` polls without blocking.
    pub block_timeout_ms: Option<u64>,

    /// Jobs processed concurrently per worker instance.
    pub max_concurrent_jobs: usize,

    /// Idle time after which pending deliveries are reclaimed.
    pub claim_idle_ms: u64,

    /// Failed attempts before a job is dead-lettered.
    pub max_retries: u32,

    /// Whether exhausted/permanent failures go to the DLQ stream.
    pub enable_dlq: bool,
}

impl WorkerConfig {
    /// Build a config from a [`StreamDef`].
    pub fn from_stream_def<S: StreamDef>() -> Self {
        Self {
            stream_name: S::STREAM_NAME.to_string(),
            consumer_group: S::CONSUMER_GROUP.to_string(),
            consumer_id: format!("worker-{}", Uuid::new_v4()),
            dlq_stream: S::DLQ_STREAM.to_string(),
            metric_prefix: S::METRIC_PREFIX.to_string(),
            max_length: S::MAX_LENGTH,
            batch_size: S::BATCH_SIZE,
            block_timeout_ms: Some(S::BLOCK_TIMEOUT_MS),
            max_concurrent_jobs: 1,
            claim_idle_ms: S::CLAIM_IDLE_MS,
            max_retries: 3,
            enable_dlq: true,
        }
    }

    pub fn with_consumer_id(mut self, id: impl Into<String>) -> Self {
        self.consumer_id = id.into();
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_blocking(mut self, timeout_ms: Option<u64>) -> Self {
        self.block_timeout_ms = timeout_ms;
        self
    }

    pub fn with_max_concurrent_jobs(mut self, count: usize) -> Self {
        self.max_concurrent_jobs = count.max(1);
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_dlq(mut self, enabled: bool) -> Self {
        self.enable_dlq = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestStream;

    impl StreamDef for TestStream {
        const STREAM_NAME: &'static str = "test:stream";
        const CONSUMER_GROUP: &'static str = "test:group";
        const DLQ_STREAM: &'static str = "test:dlq";
        const METRIC_PREFIX: &'static str = "test";
    }

    #[test]
    fn from_stream_def_copies_constants() {
        let config = WorkerConfig::from_stream_def::<TestStream>();

        assert_eq!(config.stream_name, "test:stream");
        assert_eq!(config.consumer_group, "test:group");
        assert_eq!(config.dlq_stream, "test:dlq");
        assert_eq!(config.metric_prefix, "test");
        assert!(config.consumer_id.starts_with("worker-"));
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn builders_override_defaults() {
        let config = WorkerConfig::from_stream_def::<TestStream>()
            .with_consumer_id("worker-1")
            .with_batch_size(50)
            .with_max_concurrent_jobs(0)
            .with_max_retries(5)
            .with_blocking(Some(1_000));

        assert_eq!(config.consumer_id, "worker-1");
        assert_eq!(config.batch_size, 50);
        // Concurrency is clamped to at least one job.
        assert_eq!(config.max_concurrent_jobs, 1);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.block_timeout_ms, Some(1_000));
    }
}
