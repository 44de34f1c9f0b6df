//! Consumer side: group management, reads, acks, reclaim, DLQ.

use crate::config::WorkerConfig;
use crate::error::StreamError;
use crate::registry::StreamJob;
use redis::aio::ConnectionManager;
use redis::streams::{StreamAutoClaimReply, StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Reads and acknowledges jobs for one consumer within a consumer group.
#[derive(Clone)]
pub struct StreamConsumer {
    redis: ConnectionManager,
    config: WorkerConfig,
}

impl StreamConsumer {
    pub fn new(redis: ConnectionManager, config: WorkerConfig) -> Self {
        Self { redis, config }
    }

    pub fn redis(&self) -> &ConnectionManager {
        &self.redis
    }

    pub fn stream_name(&self) -> &str {
        &self.config.stream_name
    }

    /// Create the consumer group (and the stream) if missing.
    pub async fn ensure_consumer_group(&self) -> Result<(), StreamError> {
        let mut conn = self.redis.clone();

        let result: Result<(), redis::RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg("$")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(()) => {
                info!(
                    group = %self.config.consumer_group,
                    stream = %self.config.stream_name,
                    "Created consumer group"
                );
                Ok(())
            }
            Err(e) if e.to_string().contains("BUSYGROUP") => Ok(()),
            Err(e) => Err(StreamError::ConsumerGroup(e.to_string())),
        }
    }

    /// Read new messages for this consumer (blocking when configured).
    pub async fn read_new<J: StreamJob>(&self) -> Result<Vec<(String, J)>, StreamError> {
        self.read(">").await
    }

    /// Read deliveries already assigned to this consumer but not yet acked.
    pub async fn read_pending<J: StreamJob>(&self) -> Result<Vec<(String, J)>, StreamError> {
        self.read("0").await
    }

    async fn read<J: StreamJob>(&self, cursor: &str) -> Result<Vec<(String, J)>, StreamError> {
        let mut conn = self.redis.clone();

        let mut opts = StreamReadOptions::default()
            .group(&self.config.consumer_group, &self.config.consumer_id)
            .count(self.config.batch_size);

        // Only block for new messages; the pending read must return at once.
        if cursor == ">" {
            if let Some(timeout_ms) = self.config.block_timeout_ms {
                opts = opts.block(timeout_ms as usize);
            }
        }

        let result: Result<StreamReadReply, _> = conn
            .xread_options(&[&self.config.stream_name], &[cursor], &opts)
            .await;

        match result {
            Ok(reply) => self.parse_reply(reply).await,
            Err(e) => {
                let err = StreamError::Redis(e);
                // An empty blocking read surfaces as a timeout on some
                // connection layers; treat it as "no messages".
                if err.is_block_timeout() {
                    Ok(vec![])
                } else {
                    Err(err)
                }
            }
        }
    }

    async fn parse_reply<J: StreamJob>(
        &self,
        reply: StreamReadReply,
    ) -> Result<Vec<(String, J)>, StreamError> {
        let mut jobs = Vec::new();

        for stream_key in reply.keys {
            for message in stream_key.ids {
                match parse_job::<J>(&message.map) {
                    Ok(job) => jobs.push((message.id, job)),
                    Err(e) => {
                        warn!(
                            message_id = %message.id,
                            error = %e,
                            "Unparseable message, dead-lettering"
                        );
                        self.dead_letter_raw(&message.id, &e.to_string()).await?;
                        self.ack(&message.id).await?;
                    }
                }
            }
        }

        Ok(jobs)
    }

    /// Acknowledge a delivery.
    pub async fn ack(&self, message_id: &str) -> Result<(), StreamError> {
        let mut conn = self.redis.clone();

        let _: () = conn
            .xack(
                &self.config.stream_name,
                &self.config.consumer_group,
                &[message_id],
            )
            .await?;

        debug!(message_id = %message_id, "Acked message");
        Ok(())
    }

    /// Re-queue a job (typically with an incremented retry count).
    pub async fn requeue<J: StreamJob>(&self, job: &J) -> Result<(), StreamError> {
        let mut conn = self.redis.clone();
        let job_json = serde_json::to_string(job)?;

        let _: String = redis::cmd("XADD")
            .arg(&self.config.stream_name)
            .arg("MAXLEN")
            .arg("~")
            .arg(self.config.max_length)
            .arg("*")
            .arg("job")
            .arg(&job_json)
            .query_async(&mut conn)
            .await?;

        debug!(
            job_id = %job.job_id(),
            retry_count = %job.retry_count(),
            "Re-queued job"
        );
        Ok(())
    }

    /// Move a failed job to the dead letter stream.
    pub async fn move_to_dlq<J: StreamJob>(&self, job: &J, error: &str) -> Result<(), StreamError> {
        if !self.config.enable_dlq {
            return Ok(());
        }

        let mut conn = self.redis.clone();

        let entry = serde_json::json!({
            "job": job,
            "error": error,
            "retry_count": job.retry_count(),
            "failed_at": chrono::Utc::now().to_rfc3339(),
        });

        let _: String = redis::cmd("XADD")
            .arg(&self.config.dlq_stream)
            .arg("*")
            .arg("data")
            .arg(entry.to_string())
            .query_async(&mut conn)
            .await?;

        warn!(
            job_id = %job.job_id(),
            dlq = %self.config.dlq_stream,
            "Moved job to DLQ"
        );
        Ok(())
    }

    async fn dead_letter_raw(&self, message_id: &str, error: &str) -> Result<(), StreamError> {
        if !self.config.enable_dlq {
            return Ok(());
        }

        let mut conn = self.redis.clone();

        let entry = serde_json::json!({
            "original_id": message_id,
            "error": error,
            "failed_at": chrono::Utc::now().to_rfc3339(),
        });

        let _: String = redis::cmd("XADD")
            .arg(&self.config.dlq_stream)
            .arg("*")
            .arg("data")
            .arg(entry.to_string())
            .query_async(&mut conn)
            .await?;

        Ok(())
    }

    /// Claim pending deliveries idle for longer than `min_idle_ms`.
    ///
    /// With `min_idle_ms = 0` this adopts every pending delivery in the
    /// group, which new workers run at startup so messages owned by dead
    /// consumer IDs are not stranded. Returns the claimed jobs for
    /// processing.
    pub async fn claim_stale<J: StreamJob>(
        &self,
        min_idle_ms: u64,
    ) -> Result<Vec<(String, J)>, StreamError> {
        let mut conn = self.redis.clone();
        let mut claimed_jobs = Vec::new();
        let mut cursor = "0-0".to_string();

        loop {
            let reply: StreamAutoClaimReply = redis::cmd("XAUTOCLAIM")
                .arg(&self.config.stream_name)
                .arg(&self.config.consumer_group)
                .arg(&self.config.consumer_id)
                .arg(min_idle_ms)
                .arg(&cursor)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;

            for message in reply.claimed {
                match parse_job::<J>(&message.map) {
                    Ok(job) => claimed_jobs.push((message.id, job)),
                    Err(e) => {
                        warn!(
                            message_id = %message.id,
                            error = %e,
                            "Unparseable claimed message, dead-lettering"
                        );
                        self.dead_letter_raw(&message.id, &e.to_string()).await?;
                        self.ack(&message.id).await?;
                    }
                }
            }

            if reply.next_stream_id == "0-0" {
                break;
            }
            cursor = reply.next_stream_id;
        }

        if !claimed_jobs.is_empty() {
            info!(
                count = claimed_jobs.len(),
                consumer = %self.config.consumer_id,
                "Claimed stale deliveries"
            );
        }

        Ok(claimed_jobs)
    }

    /// Current stream length (`XLEN`).
    pub async fn stream_length(&self) -> Result<usize, StreamError> {
        let mut conn = self.redis.clone();

        let length: usize = redis::cmd("XLEN")
            .arg(&self.config.stream_name)
            .query_async(&mut conn)
            .await?;

        Ok(length)
    }
}

fn parse_job<J: StreamJob>(map: &HashMap<String, redis::Value>) -> Result<J, StreamError> {
    let job_value = map
        .get("job")
        .ok_or_else(|| StreamError::JobParsing("Missing 'job' field in message".to_string()))?;

    let job_str = match job_value {
        redis::Value::BulkString(bytes) => String::from_utf8_lossy(bytes).to_string(),
        redis::Value::SimpleString(s) => s.clone(),
        _ => {
            return Err(StreamError::JobParsing(
                "Invalid 'job' field type".to_string(),
            ))
        }
    };

    serde_json::from_str(&job_str).map_err(|e| StreamError::JobParsing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
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

    #[test]
    fn parse_job_reads_json_field() {
        let mut map = HashMap::new();
        map.insert(
            "job".to_string(),
            redis::Value::BulkString(br#"{"id":"j1","retry_count":2}"#.to_vec()),
        );

        let job: TestJob = parse_job(&map).unwrap();
        assert_eq!(
            job,
            TestJob {
                id: "j1".to_string(),
                retry_count: 2
            }
        );
    }

    #[test]
    fn parse_job_missing_field_fails() {
        let map = HashMap::new();
        let result: Result<TestJob, _> = parse_job(&map);
        assert!(matches!(result, Err(StreamError::JobParsing(_))));
    }

    #[test]
    fn parse_job_invalid_json_fails() {
        let mut map = HashMap::new();
        map.insert(
            "job".to_string(),
            redis::Value::BulkString(b"not json".to_vec()),
        );

        let result: Result<TestJob, _> = parse_job(&map);
        assert!(matches!(result, Err(StreamError::JobParsing(_))));
    }
}
