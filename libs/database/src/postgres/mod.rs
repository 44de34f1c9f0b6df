//! PostgreSQL connector (SeaORM).

mod config;
mod connector;
mod health;

pub use config::PostgresConfig;
pub use connector::{
    connect, connect_from_config, connect_from_config_with_retry, connect_with_retry,
    run_migrations,
};
pub use health::check_postgres;

pub use sea_orm::DatabaseConnection;
