//! Database connectors for the pipeline services.
//!
//! PostgreSQL (SeaORM) holds the durable telemetry and job state; Redis
//! backs the work queues and the rate limiter. Both connectors retry at
//! startup with exponential backoff so services survive transient
//! orchestration races.

pub mod common;
pub mod postgres;
pub mod redis;

pub use common::{retry, retry_with_backoff, RetryConfig};
