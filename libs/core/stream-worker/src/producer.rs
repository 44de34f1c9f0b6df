//! Producer side: enqueue jobs onto a stream.

use crate::error::StreamError;
use crate::registry::StreamDef;
use redis::aio::ConnectionManager;
use serde::Serialize;
use tracing::debug;

/// Enqueues jobs onto a Redis stream.
///
/// Used by the API to hand work to the workers and by the job creator to
/// fan out evaluation jobs. Cheap to clone; all clones share the underlying
/// connection.
#[derive(Clone)]
pub struct StreamProducer {
    redis: ConnectionManager,
    stream_name: String,
    max_length: Option<i64>,
}

impl StreamProducer {
    pub fn new(redis: ConnectionManager, stream_name: impl Into<String>) -> Self {
        Self {
            redis,
            stream_name: stream_name.into(),
            max_length: None,
        }
    }

    /// Build a producer from a [`StreamDef`].
    pub fn from_stream_def<S: StreamDef>(redis: ConnectionManager) -> Self {
        Self {
            redis,
            stream_name: S::STREAM_NAME.to_string(),
            max_length: Some(S::MAX_LENGTH),
        }
    }

    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    /// Add one job to the stream; returns the Redis message ID.
    pub async fn send<J: Serialize>(&self, job: &J) -> Result<String, StreamError> {
        let mut conn = self.redis.clone();
        let job_json = serde_json::to_string(job)?;

        let mut cmd = redis::cmd("XADD");
        cmd.arg(&self.stream_name);
        if let Some(max_len) = self.max_length {
            // Approximate trimming keeps XADD O(1).
            cmd.arg("MAXLEN").arg("~").arg(max_len);
        }
        cmd.arg("*").arg("job").arg(&job_json);

        let message_id: String = cmd.query_async(&mut conn).await?;

        debug!(
            stream = %self.stream_name,
            message_id = %message_id,
            "Enqueued job"
        );

        Ok(message_id)
    }

    /// Add multiple jobs in one pipeline round trip.
    pub async fn send_batch<J: Serialize>(&self, jobs: &[J]) -> Result<Vec<String>, StreamError> {
        if jobs.is_empty() {
            return Ok(vec![]);
        }

        let mut conn = self.redis.clone();
        let mut pipe = redis::pipe();

        for job in jobs {
            let job_json = serde_json::to_string(job)?;
            let cmd = pipe.cmd("XADD").arg(&self.stream_name);
            if let Some(max_len) = self.max_length {
                cmd.arg("MAXLEN").arg("~").arg(max_len);
            }
            cmd.arg("*").arg("job").arg(&job_json);
        }

        let message_ids: Vec<String> = pipe.query_async(&mut conn).await?;

        debug!(
            stream = %self.stream_name,
            count = message_ids.len(),
            "Enqueued job batch"
        );

        Ok(message_ids)
    }

    /// Current stream length (`XLEN`).
    pub async fn stream_length(&self) -> Result<usize, StreamError> {
        let mut conn = self.redis.clone();

        let length: usize = redis::cmd("XLEN")
            .arg(&self.stream_name)
            .query_async(&mut conn)
            .await?;

        Ok(length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestStream;

    impl StreamDef for TestStream {
        const STREAM_NAME: &'static str = "test:jobs";
        const CONSUMER_GROUP: &'static str = "test-workers";
        const DLQ_STREAM: &'static str = "test:jobs:dlq";
        const METRIC_PREFIX: &'static str = "test_jobs";
        const MAX_LENGTH: i64 = 1_000;
    }

    #[test]
    fn stream_def_constants_drive_producer_setup() {
        assert_eq!(TestStream::STREAM_NAME, "test:jobs");
        assert_eq!(TestStream::MAX_LENGTH, 1_000);
    }
}
