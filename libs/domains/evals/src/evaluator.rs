//! Eval execution: the evaluator seam and a minimal implementation.

use crate::error::{EvalError, EvalResult};
use crate::repository::JobExecutionRepository;
use crate::stream_models::EvalExecutionJob;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Business seam invoked per evaluation job. Implementations own the
/// scoring logic and are responsible for the `COMPLETED` transition.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(&self, job: &EvalExecutionJob) -> EvalResult<()>;
}

/// Evaluator that completes jobs without scoring.
///
/// Used where no model-backed evaluator is wired in; it still honors the
/// lifecycle contract (missing executions fail, terminal rows are left
/// untouched, successful runs end `COMPLETED`).
pub struct NoopEvaluator {
    executions: Arc<dyn JobExecutionRepository>,
}

impl NoopEvaluator {
    pub fn new(executions: Arc<dyn JobExecutionRepository>) -> Self {
        Self { executions }
    }
}

#[async_trait]
impl Evaluator for NoopEvaluator {
    async fn evaluate(&self, job: &EvalExecutionJob) -> EvalResult<()> {
        let execution = self
            .executions
            .find(job.job_execution_id, job.project_id)
            .await?
            .ok_or_else(|| {
                EvalError::NotFound(format!(
                    "Job execution {} not found",
                    job.job_execution_id
                ))
            })?;

        // Fast path for duplicate deliveries. Not a guard: the repository's
        // conditional update only ever transitions a PENDING row, so a
        // concurrent duplicate cannot overwrite a terminal status either way.
        if execution.status.is_terminal() {
            debug!(
                job_execution_id = %execution.id,
                status = ?execution.status,
                "Job execution already terminal, skipping"
            );
            return Ok(());
        }

        self.executions
            .mark_completed(job.job_execution_id, job.project_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::job_executions::JobExecutionStatus;
    use crate::repository::{JobExecution, MockJobExecutionRepository};
    use uuid::Uuid;

    fn execution(id: Uuid, project_id: Uuid, status: JobExecutionStatus) -> JobExecution {
        JobExecution {
            id,
            project_id,
            trace_id: "trace-1".to_string(),
            status,
            end_time: None,
            error: None,
        }
    }

    #[tokio::test]
    async fn pending_execution_is_completed() {
        let job = EvalExecutionJob::new(Uuid::new_v4(), Uuid::new_v4());
        let (id, project_id) = (job.job_execution_id, job.project_id);

        let mut repo = MockJobExecutionRepository::new();
        repo.expect_find()
            .returning(move |id, project_id| {
                Ok(Some(execution(id, project_id, JobExecutionStatus::Pending)))
            });
        repo.expect_mark_completed()
            .withf(move |i, p| *i == id && *p == project_id)
            .times(1)
            .returning(|_, _| Ok(()));

        NoopEvaluator::new(Arc::new(repo)).evaluate(&job).await.unwrap();
    }

    #[tokio::test]
    async fn missing_execution_is_not_found() {
        let mut repo = MockJobExecutionRepository::new();
        repo.expect_find().returning(|_, _| Ok(None));
        repo.expect_mark_completed().times(0);

        let job = EvalExecutionJob::new(Uuid::new_v4(), Uuid::new_v4());
        let err = NoopEvaluator::new(Arc::new(repo))
            .evaluate(&job)
            .await
            .unwrap_err();

        assert!(matches!(err, EvalError::NotFound(_)));
    }

    #[tokio::test]
    async fn terminal_execution_is_left_untouched() {
        let mut repo = MockJobExecutionRepository::new();
        repo.expect_find().returning(|id, project_id| {
            Ok(Some(execution(id, project_id, JobExecutionStatus::Completed)))
        });
        repo.expect_mark_completed().times(0);

        let job = EvalExecutionJob::new(Uuid::new_v4(), Uuid::new_v4());
        NoopEvaluator::new(Arc::new(repo)).evaluate(&job).await.unwrap();
    }
}
