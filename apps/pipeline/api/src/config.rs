//! Configuration for the ingestion API service.

use core_config::pipeline::{CloudConfig, WorkerEndpoint};
use core_config::server::ServerConfig;
use core_config::{ConfigError, Environment, FromEnv};
use database::postgres::PostgresConfig;
use database::redis::RedisConfig;

#[derive(Clone, Debug)]
pub struct Config {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: PostgresConfig,
    pub redis: RedisConfig,
    pub cloud: CloudConfig,
    pub worker: WorkerEndpoint,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            environment: Environment::from_env(),
            server: ServerConfig::from_env()?,
            database: PostgresConfig::from_env()?,
            redis: RedisConfig::from_env()?,
            cloud: CloudConfig::from_env()?,
            worker: WorkerEndpoint::from_env()?,
        })
    }
}
