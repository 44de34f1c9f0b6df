//! Redis connector.
//!
//! A single `ConnectionManager` is shared by the stream queues and the rate
//! limiter; it reconnects automatically and clones cheaply.

mod config;
mod connector;
mod health;

pub use config::RedisConfig;
pub use connector::{connect, connect_from_config, connect_from_config_with_retry, connect_with_retry};
pub use health::check_redis;

pub use redis::aio::ConnectionManager;
