//! Redis Streams work queue framework.
//!
//! Durable, at-least-once job distribution between the ingestion API and the
//! evaluation workers:
//!
//! ```text
//! StreamProducer ──XADD──► Redis Stream ──XREADGROUP──► StreamWorker<J, P>
//!                                                          │ ok: XACK
//!                                                          │ err: re-queue with retry++ (backoff)
//!                                                          └ exhausted/permanent: DLQ stream
//! ```
//!
//! Jobs survive worker crashes: unacknowledged deliveries stay in the
//! consumer group's pending list and are reclaimed with `XAUTOCLAIM` once
//! their visibility timeout elapses.
//!
//! # Example
//!
//! ```rust,ignore
//! struct MyStream;
//!
//! impl StreamDef for MyStream {
//!     const STREAM_NAME: &'static str = "MyJobs";
//!     const CONSUMER_GROUP: &'static str = "my-workers";
//!     const DLQ_STREAM: &'static str = "MyJobs:dlq";
//!     const METRIC_PREFIX: &'static str = "my_jobs";
//! }
//!
//! let config = WorkerConfig::from_stream_def::<MyStream>().with_max_concurrent_jobs(4);
//! let worker = StreamWorker::new(redis, processor, config);
//! worker.run(shutdown_rx).await?;
//! ```

mod config;
mod consumer;
mod error;
pub mod health;
pub mod metrics;
mod producer;
mod registry;
mod worker;

pub use config::WorkerConfig;
pub use consumer::StreamConsumer;
pub use error::{ErrorCategory, StreamError};
pub use health::{health_router, HealthState};
pub use producer::StreamProducer;
pub use registry::{StreamDef, StreamJob, StreamProcessor};
pub use worker::StreamWorker;

/// Result type alias for stream operations.
pub type StreamResult<T> = Result<T, StreamError>;
