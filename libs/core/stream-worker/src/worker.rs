//! The generic worker run loop.

use crate::config::WorkerConfig;
use crate::consumer::StreamConsumer;
use crate::error::StreamError;
use crate::metrics::{self, JobStatus};
use crate::registry::{StreamJob, StreamProcessor};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Consumes a stream and feeds jobs to a [`StreamProcessor`].
///
/// Delivery semantics are at-least-once:
/// - success → `XACK`
/// - retryable failure → re-queue with `retry_count + 1`, `XACK` the
///   original delivery immediately (never held un-acked across a backoff)
/// - permanent failure or retries exhausted → DLQ, `XACK`
/// - crash mid-flight → delivery stays pending and is reclaimed via
///   `XAUTOCLAIM` once the visibility timeout elapses
pub struct StreamWorker<J, P>
where
    J: StreamJob,
    P: StreamProcessor<J>,
{
    consumer: StreamConsumer,
    processor: Arc<P>,
    config: WorkerConfig,
    semaphore: Arc<Semaphore>,
    _phantom: PhantomData<J>,
}

impl<J, P> StreamWorker<J, P>
where
    J: StreamJob,
    P: StreamProcessor<J> + 'static,
{
    pub fn new(redis: redis::aio::ConnectionManager, processor: P, config: WorkerConfig) -> Self {
        Self::with_arc_processor(redis, Arc::new(processor), config)
    }

    pub fn with_arc_processor(
        redis: redis::aio::ConnectionManager,
        processor: Arc<P>,
        config: WorkerConfig,
    ) -> Self {
        let consumer = StreamConsumer::new(redis, config.clone());
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs));

        Self {
            consumer,
            processor,
            config,
            semaphore,
            _phantom: PhantomData,
        }
    }

    pub fn consumer(&self) -> &StreamConsumer {
        &self.consumer
    }

    /// Run until the shutdown channel flips to `true`.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), StreamError> {
        info!(
            stream = %self.config.stream_name,
            group = %self.config.consumer_group,
            consumer_id = %self.config.consumer_id,
            processor = %self.processor.name(),
            max_concurrent_jobs = %self.config.max_concurrent_jobs,
            batch_size = %self.config.batch_size,
            "Starting stream worker"
        );

        self.consumer.ensure_consumer_group().await?;

        // Adopt deliveries stranded by previous consumer IDs.
        match self.consumer.claim_stale::<J>(0).await {
            Ok(stranded) if !stranded.is_empty() => self.process_jobs(stranded).await,
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Failed to claim stranded deliveries on startup"),
        }

        let claim_interval = Duration::from_millis(self.config.claim_idle_ms * 2);
        let mut last_claim = std::time::Instant::now();
        let mut consecutive_errors: u32 = 0;
        const MAX_BACKOFF_SECS: u64 = 30;

        loop {
            if *shutdown.borrow() {
                info!("Received shutdown signal, stopping worker");
                break;
            }

            match self.poll_once().await {
                Ok(()) => {
                    if consecutive_errors > 0 {
                        info!(
                            "Stream read recovered after {} errors",
                            consecutive_errors
                        );
                        consecutive_errors = 0;
                    }
                }
                Err(e) if e.is_block_timeout() => {
                    debug!("Blocking read timed out with no messages");
                }
                Err(e) => {
                    consecutive_errors += 1;

                    if e.is_nogroup_error() {
                        warn!("Consumer group missing, recreating");
                        if let Err(create_err) = self.consumer.ensure_consumer_group().await {
                            error!(error = %create_err, "Failed to recreate consumer group");
                        }
                    } else if e.is_connection_error() {
                        let backoff_secs =
                            2u64.pow(consecutive_errors.min(5)).min(MAX_BACKOFF_SECS);
                        warn!(
                            error = %e,
                            backoff_secs = %backoff_secs,
                            "Redis connection error, backing off"
                        );
                        tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                    } else {
                        error!(error = %e, "Error reading from stream");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                    continue;
                }
            }

            if last_claim.elapsed() >= claim_interval {
                match self.consumer.claim_stale::<J>(self.config.claim_idle_ms).await {
                    Ok(reclaimed) if !reclaimed.is_empty() => self.process_jobs(reclaimed).await,
                    Ok(_) => {}
                    Err(e) => debug!(error = %e, "Error claiming stale deliveries"),
                }
                last_claim = std::time::Instant::now();
            }

            // In polling mode (no blocking read) wait before the next poll,
            // waking early on shutdown.
            if self.config.block_timeout_ms.is_none() {
                tokio::select! {
                    _ = shutdown.changed() => {}
                    _ = tokio::time::sleep(Duration::from_millis(500)) => {}
                }
            }
        }

        info!("Stream worker stopped");
        Ok(())
    }

    /// Read one batch (own pending first, then new) and process it.
    async fn poll_once(&self) -> Result<(), StreamError> {
        let pending = self.consumer.read_pending::<J>().await?;
        let new_messages = self.consumer.read_new::<J>().await?;

        if let Ok(length) = self.consumer.stream_length().await {
            metrics::set_queue_length(&self.config.metric_prefix, length as f64);
        }

        let jobs: Vec<(String, J)> = pending.into_iter().chain(new_messages).collect();
        if jobs.is_empty() {
            return Ok(());
        }

        self.process_jobs(jobs).await;
        Ok(())
    }

    /// Process a set of jobs with bounded concurrency.
    async fn process_jobs(&self, jobs: Vec<(String, J)>) {
        let mut join_set: JoinSet<()> = JoinSet::new();
        let in_flight = Arc::new(AtomicUsize::new(0));

        for (message_id, job) in jobs {
            let semaphore = Arc::clone(&self.semaphore);
            let processor = Arc::clone(&self.processor);
            let consumer = self.consumer.clone();
            let config = self.config.clone();
            let in_flight = Arc::clone(&in_flight);

            join_set.spawn(async move {
                let _permit = semaphore.acquire().await.expect("Semaphore closed");

                let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                metrics::set_in_flight(&config.stream_name, current as f64);

                process_one(&consumer, &processor, &config, &message_id, &job).await;

                let current = in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
                metrics::set_in_flight(&config.stream_name, current as f64);
            });
        }

        while join_set.join_next().await.is_some() {}
    }
}

/// Process one delivery and settle it (ack / re-queue / DLQ).
async fn process_one<J, P>(
    consumer: &StreamConsumer,
    processor: &Arc<P>,
    config: &WorkerConfig,
    message_id: &str,
    job: &J,
) where
    J: StreamJob,
    P: StreamProcessor<J>,
{
    debug!(
        message_id = %message_id,
        job_id = %job.job_id(),
        retry_count = %job.retry_count(),
        "Processing job"
    );

    let start = std::time::Instant::now();

    match processor.process(job).await {
        Ok(()) => {
            metrics::record_job_processed(&config.stream_name, JobStatus::Success);
            metrics::record_job_duration(&config.stream_name, start.elapsed());

            if let Err(e) = consumer.ack(message_id).await {
                // Left pending; the delivery will be reclaimed and the
                // processor must tolerate the duplicate.
                error!(message_id = %message_id, error = %e, "Failed to ack message");
            }
        }
        Err(e) => {
            metrics::record_job_processed(&config.stream_name, JobStatus::Failed);

            let category = e.category();
            warn!(
                message_id = %message_id,
                job_id = %job.job_id(),
                error = %e,
                category = ?category,
                "Job processing failed"
            );

            if let Err(settle_err) =
                settle_failure(consumer, config, message_id, job, &e).await
            {
                error!(
                    message_id = %message_id,
                    error = %settle_err,
                    "Failed to settle failed job; leaving delivery pending"
                );
            }
        }
    }
}

/// Decide between re-queue with backoff and the DLQ, then ack the original.
async fn settle_failure<J: StreamJob>(
    consumer: &StreamConsumer,
    config: &WorkerConfig,
    message_id: &str,
    job: &J,
    error: &StreamError,
) -> Result<(), StreamError> {
    let category = error.category();

    if !category.should_retry() || job.exceeded_max_retries(config.max_retries) {
        metrics::record_job_processed(&config.stream_name, JobStatus::Dlq);
        consumer.move_to_dlq(job, &error.to_string()).await?;
        consumer.ack(message_id).await?;
        return Ok(());
    }

    let attempt = job.retry_count();
    metrics::record_retry(&config.stream_name, attempt + 1);

    if let Some(delay) = category.delay_for_attempt(attempt) {
        debug!(
            job_id = %job.job_id(),
            retry_attempt = %(attempt + 1),
            backoff_hint_ms = %delay.as_millis(),
            "Scheduling job retry"
        );
    }

    // Settle immediately: holding the delivery un-acked through a backoff
    // sleep would cross the claim-idle threshold and hand the same
    // delivery to a second consumer.
    consumer.requeue(&job.with_retry()).await?;
    consumer.ack(message_id).await?;

    Ok(())
}
