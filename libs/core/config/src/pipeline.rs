//! Pipeline-specific settings shared by the API and the eval workers.

use crate::{env_parsed, ConfigError, FromEnv};
use std::env;

/// Cloud deployment settings.
///
/// Presence of the cloud region enables per-organization rate limiting;
/// presence of the Sentry DSN marks exception capture as active.
#[derive(Clone, Debug, Default)]
pub struct CloudConfig {
    pub region: Option<String>,
    pub sentry_dsn: Option<String>,
}

impl CloudConfig {
    /// Rate limiting only applies to cloud deployments.
    pub fn is_cloud(&self) -> bool {
        self.region.is_some()
    }
}

impl FromEnv for CloudConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            region: env::var("NEXT_PUBLIC_LANGFUSE_CLOUD_REGION").ok(),
            sentry_dsn: env::var("NEXT_PUBLIC_SENTRY_DSN").ok(),
        })
    }
}

/// Target of the cross-service trace-upsert notification.
///
/// Both variables must be set for dispatch to be active; a partially
/// configured endpoint disables it.
#[derive(Clone, Debug, Default)]
pub struct WorkerEndpoint {
    pub host: Option<String>,
    pub password: Option<String>,
}

impl WorkerEndpoint {
    pub fn is_configured(&self) -> bool {
        self.host.is_some() && self.password.is_some()
    }
}

impl FromEnv for WorkerEndpoint {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("WORKER_HOST").ok(),
            password: env::var("WORKER_PASSWORD").ok(),
        })
    }
}

/// Worker pool sizes for the two evaluation queues.
#[derive(Clone, Copy, Debug)]
pub struct EvalWorkerSettings {
    pub creator_concurrency: usize,
    pub executor_concurrency: usize,
}

impl FromEnv for EvalWorkerSettings {
    /// Reads `LANGFUSE_EVAL_CREATOR_WORKER_CONCURRENCY` (default 2) and
    /// `LANGFUSE_EVAL_EXECUTION_WORKER_CONCURRENCY` (default 4).
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            creator_concurrency: env_parsed("LANGFUSE_EVAL_CREATOR_WORKER_CONCURRENCY", "2")?,
            executor_concurrency: env_parsed("LANGFUSE_EVAL_EXECUTION_WORKER_CONCURRENCY", "4")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cloud_config_defaults_to_self_hosted() {
        temp_env::with_vars(
            [
                ("NEXT_PUBLIC_LANGFUSE_CLOUD_REGION", None::<&str>),
                ("NEXT_PUBLIC_SENTRY_DSN", None::<&str>),
            ],
            || {
                let config = CloudConfig::from_env().unwrap();
                assert!(!config.is_cloud());
                assert!(config.sentry_dsn.is_none());
            },
        );
    }

    #[test]
    fn cloud_config_region_enables_cloud() {
        temp_env::with_var("NEXT_PUBLIC_LANGFUSE_CLOUD_REGION", Some("eu-west-1"), || {
            let config = CloudConfig::from_env().unwrap();
            assert!(config.is_cloud());
            assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        });
    }

    #[test]
    fn worker_endpoint_requires_both_variables() {
        temp_env::with_vars(
            [
                ("WORKER_HOST", Some("http://worker:3030")),
                ("WORKER_PASSWORD", None::<&str>),
            ],
            || {
                let endpoint = WorkerEndpoint::from_env().unwrap();
                assert!(!endpoint.is_configured());
            },
        );

        temp_env::with_vars(
            [
                ("WORKER_HOST", Some("http://worker:3030")),
                ("WORKER_PASSWORD", Some("secret")),
            ],
            || {
                let endpoint = WorkerEndpoint::from_env().unwrap();
                assert!(endpoint.is_configured());
            },
        );
    }

    #[test]
    fn eval_worker_settings_defaults() {
        temp_env::with_vars(
            [
                ("LANGFUSE_EVAL_CREATOR_WORKER_CONCURRENCY", None::<&str>),
                ("LANGFUSE_EVAL_EXECUTION_WORKER_CONCURRENCY", None::<&str>),
            ],
            || {
                let settings = EvalWorkerSettings::from_env().unwrap();
                assert_eq!(settings.creator_concurrency, 2);
                assert_eq!(settings.executor_concurrency, 4);
            },
        );
    }

    #[test]
    fn eval_worker_settings_from_env() {
        temp_env::with_vars(
            [
                ("LANGFUSE_EVAL_CREATOR_WORKER_CONCURRENCY", Some("8")),
                ("LANGFUSE_EVAL_EXECUTION_WORKER_CONCURRENCY", Some("16")),
            ],
            || {
                let settings = EvalWorkerSettings::from_env().unwrap();
                assert_eq!(settings.creator_concurrency, 8);
                assert_eq!(settings.executor_concurrency, 16);
            },
        );
    }

    #[test]
    fn eval_worker_settings_invalid_value() {
        temp_env::with_var(
            "LANGFUSE_EVAL_CREATOR_WORKER_CONCURRENCY",
            Some("many"),
            || {
                let err = EvalWorkerSettings::from_env().unwrap_err();
                assert!(err
                    .to_string()
                    .contains("LANGFUSE_EVAL_CREATOR_WORKER_CONCURRENCY"));
            },
        );
    }
}
