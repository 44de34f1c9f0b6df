//! Persistence interfaces for evaluation state.

use crate::entity::job_executions::JobExecutionStatus;
use crate::error::EvalResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Evaluation rule, as consulted by the job creator.
#[derive(Debug, Clone)]
pub struct JobConfiguration {
    pub id: Uuid,
    pub project_id: Uuid,
    pub evaluator: String,
    pub sampling: f64,
}

/// Input for a new pending job execution.
#[derive(Debug, Clone)]
pub struct NewJobExecution {
    pub project_id: Uuid,
    pub job_configuration_id: Option<Uuid>,
    pub trace_id: String,
}

/// Job execution as seen by the executor.
#[derive(Debug, Clone)]
pub struct JobExecution {
    pub id: Uuid,
    pub project_id: Uuid,
    pub trace_id: String,
    pub status: JobExecutionStatus,
    pub end_time: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

/// Read access to configured evaluation rules.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobConfigurationRepository: Send + Sync {
    /// Enabled rules for a project.
    async fn enabled_for_project(&self, project_id: Uuid) -> EvalResult<Vec<JobConfiguration>>;
}

/// Job execution lifecycle writes.
///
/// Status is monotone: `mark_completed` and `mark_failed` are single
/// conditional updates that match only `PENDING` rows, so concurrent
/// duplicates and late retries can never overwrite a terminal state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobExecutionRepository: Send + Sync {
    /// Create a `PENDING` execution; returns its ID.
    async fn insert_pending(&self, execution: NewJobExecution) -> EvalResult<Uuid>;

    async fn find(&self, id: Uuid, project_id: Uuid) -> EvalResult<Option<JobExecution>>;

    /// Transition `(id, project_id)` to `COMPLETED` with `end_time = now`.
    async fn mark_completed(&self, id: Uuid, project_id: Uuid) -> EvalResult<()>;

    /// Transition `(id, project_id)` to `ERROR` with `end_time = now` and
    /// the given user-facing error message.
    async fn mark_failed(&self, id: Uuid, project_id: Uuid, display_error: &str)
        -> EvalResult<()>;
}
