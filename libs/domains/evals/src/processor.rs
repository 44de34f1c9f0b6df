//! Stream processors for the two evaluation queues.
//!
//! Both record their queue metrics, run the business seam inside a
//! consumer span, and re-throw failures so the queue framework owns
//! redelivery. The executor additionally persists terminal failure state
//! before re-throwing.

use crate::creator::EvalJobCreator;
#[cfg(test)]
use crate::error::EvalError;
use crate::evaluator::Evaluator;
use crate::repository::JobExecutionRepository;
use crate::stream_models::{EvalExecutionJob, TraceUpsertJob};
use async_trait::async_trait;
use observability::{instrument, record_histogram, record_increment, InstrumentOpts};
use std::sync::Arc;
use stream_worker::{StreamError, StreamProcessor};
use tracing::{debug, error, info};

/// Consumes trace-upsert jobs and materializes evaluation jobs.
pub struct EvalJobCreatorProcessor<C: EvalJobCreator> {
    creator: C,
}

impl<C: EvalJobCreator> EvalJobCreatorProcessor<C> {
    pub fn new(creator: C) -> Self {
        Self { creator }
    }
}

#[async_trait]
impl<C: EvalJobCreator> StreamProcessor<TraceUpsertJob> for EvalJobCreatorProcessor<C> {
    async fn process(&self, job: &TraceUpsertJob) -> Result<(), StreamError> {
        record_increment("trace_upsert_queue_request", 1, &[]);
        record_histogram("trace_upsert_queue_wait_time_ms", job.queue_wait_ms(), &[]);

        let start = std::time::Instant::now();

        // Each upsert starts a fresh trace: this is the pipeline's entry
        // point on the worker side.
        let result = instrument(
            InstrumentOpts::root_consumer("trace_upsert"),
            self.creator.create_eval_jobs(job),
        )
        .await;

        record_histogram(
            "trace_upsert_queue_processing_time_ms",
            start.elapsed().as_millis() as f64,
            &[],
        );

        match result {
            Ok(created) => {
                info!(
                    trace_id = %job.trace_id,
                    project_id = %job.project_id,
                    created = created,
                    "Processed trace upsert"
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    trace_id = %job.trace_id,
                    project_id = %job.project_id,
                    error = %e,
                    "Eval job creation failed"
                );
                observability::trace_exception(&e);
                Err(e.into())
            }
        }
    }

    fn name(&self) -> &'static str {
        "EvalJobCreatorProcessor"
    }
}

/// Consumes evaluation jobs and records their terminal status.
pub struct EvalExecutorProcessor<E: Evaluator> {
    evaluator: E,
    executions: Arc<dyn JobExecutionRepository>,
}

impl<E: Evaluator> EvalExecutorProcessor<E> {
    pub fn new(evaluator: E, executions: Arc<dyn JobExecutionRepository>) -> Self {
        Self {
            evaluator,
            executions,
        }
    }
}

#[async_trait]
impl<E: Evaluator> StreamProcessor<EvalExecutionJob> for EvalExecutorProcessor<E> {
    async fn process(&self, job: &EvalExecutionJob) -> Result<(), StreamError> {
        record_increment("eval_execution_queue_request", 1, &[]);
        record_histogram("eval_execution_queue_wait_time_ms", job.queue_wait_ms(), &[]);

        let start = std::time::Instant::now();

        // Child span: the creator's context is the parent when present.
        let result = instrument(
            InstrumentOpts::consumer("eval_execution"),
            self.evaluator.evaluate(job),
        )
        .await;

        record_histogram(
            "eval_execution_queue_processing_time_ms",
            start.elapsed().as_millis() as f64,
            &[],
        );

        match result {
            Ok(()) => {
                debug!(
                    job_execution_id = %job.job_execution_id,
                    project_id = %job.project_id,
                    "Evaluation completed"
                );
                Ok(())
            }
            Err(e) => {
                let display_error = e.display_message();

                // Terminal failure is visible to users even if the queue
                // keeps retrying the attempt.
                if let Err(persist_err) = self
                    .executions
                    .mark_failed(job.job_execution_id, job.project_id, &display_error)
                    .await
                {
                    error!(
                        job_execution_id = %job.job_execution_id,
                        error = %persist_err,
                        "Failed to persist evaluation failure"
                    );
                }

                if e.is_expected() {
                    debug!(
                        job_execution_id = %job.job_execution_id,
                        error = %e,
                        "Evaluation failed with expected error"
                    );
                } else {
                    error!(
                        job_execution_id = %job.job_execution_id,
                        project_id = %job.project_id,
                        error = %e,
                        "Evaluation failed"
                    );
                    observability::trace_exception(&e);
                }

                Err(e.into())
            }
        }
    }

    fn name(&self) -> &'static str {
        "EvalExecutorProcessor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalResult;
    use crate::repository::MockJobExecutionRepository;
    use uuid::Uuid;

    struct ScriptedCreator {
        result: fn() -> EvalResult<usize>,
    }

    #[async_trait]
    impl EvalJobCreator for ScriptedCreator {
        async fn create_eval_jobs(&self, _job: &TraceUpsertJob) -> EvalResult<usize> {
            (self.result)()
        }
    }

    struct ScriptedEvaluator {
        result: fn() -> EvalResult<()>,
    }

    #[async_trait]
    impl Evaluator for ScriptedEvaluator {
        async fn evaluate(&self, _job: &EvalExecutionJob) -> EvalResult<()> {
            (self.result)()
        }
    }

    #[tokio::test]
    async fn creator_success_acks() {
        let processor = EvalJobCreatorProcessor::new(ScriptedCreator { result: || Ok(2) });
        let job = TraceUpsertJob::new("trace-1", Uuid::new_v4());

        assert!(processor.process(&job).await.is_ok());
    }

    #[tokio::test]
    async fn creator_failure_is_rethrown_for_redelivery() {
        let processor = EvalJobCreatorProcessor::new(ScriptedCreator {
            result: || Err(EvalError::Database("down".to_string())),
        });
        let job = TraceUpsertJob::new("trace-1", Uuid::new_v4());

        let err = processor.process(&job).await.unwrap_err();
        assert!(err.category().should_retry());
    }

    #[tokio::test]
    async fn executor_failure_persists_error_status_and_rethrows() {
        let job = EvalExecutionJob::new(Uuid::new_v4(), Uuid::new_v4());
        let (id, project_id) = (job.job_execution_id, job.project_id);

        let mut repo = MockJobExecutionRepository::new();
        repo.expect_mark_failed()
            .withf(move |i, p, msg| {
                *i == id && *p == project_id && msg == "An internal error occurred"
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let processor = EvalExecutorProcessor::new(
            ScriptedEvaluator {
                result: || Err(EvalError::Database("connection refused".to_string())),
            },
            Arc::new(repo),
        );

        assert!(processor.process(&job).await.is_err());
    }

    #[tokio::test]
    async fn expected_errors_still_persist_their_message() {
        let job = EvalExecutionJob::new(Uuid::new_v4(), Uuid::new_v4());

        let mut repo = MockJobExecutionRepository::new();
        repo.expect_mark_failed()
            .withf(|_, _, msg| msg == "No API key for provider openai configured")
            .times(1)
            .returning(|_, _, _| Ok(()));

        let processor = EvalExecutorProcessor::new(
            ScriptedEvaluator {
                result: || {
                    Err(EvalError::Api(
                        "No API key for provider openai configured".to_string(),
                    ))
                },
            },
            Arc::new(repo),
        );

        // The attempt still fails so the queue records it.
        assert!(processor.process(&job).await.is_err());
    }

    #[tokio::test]
    async fn executor_success_touches_no_failure_state() {
        let job = EvalExecutionJob::new(Uuid::new_v4(), Uuid::new_v4());

        let mut repo = MockJobExecutionRepository::new();
        repo.expect_mark_failed().times(0);

        let processor = EvalExecutorProcessor::new(
            ScriptedEvaluator { result: || Ok(()) },
            Arc::new(repo),
        );

        assert!(processor.process(&job).await.is_ok());
    }

    #[tokio::test]
    async fn persistence_failure_does_not_mask_the_original_error() {
        let job = EvalExecutionJob::new(Uuid::new_v4(), Uuid::new_v4());

        let mut repo = MockJobExecutionRepository::new();
        repo.expect_mark_failed()
            .returning(|_, _, _| Err(EvalError::Database("also down".to_string())));

        let processor = EvalExecutorProcessor::new(
            ScriptedEvaluator {
                result: || Err(EvalError::Internal("boom".to_string())),
            },
            Arc::new(repo),
        );

        let err = processor.process(&job).await.unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}
