//! Eval job creation: trace upsert → pending job executions.

use crate::error::{EvalError, EvalResult};
use crate::repository::{JobConfigurationRepository, JobExecutionRepository, NewJobExecution};
use crate::stream_models::{EvalExecutionJob, TraceUpsertJob};
use async_trait::async_trait;
use std::sync::Arc;
use stream_worker::StreamProducer;
use tracing::debug;
use uuid::Uuid;

/// Business seam invoked per trace-upsert job.
#[async_trait]
pub trait EvalJobCreator: Send + Sync {
    /// Materialize evaluation jobs for one upserted trace. Returns the
    /// number of jobs created.
    async fn create_eval_jobs(&self, job: &TraceUpsertJob) -> EvalResult<usize>;
}

/// Creates one pending job execution per enabled rule, then enqueues the
/// matching execution job.
pub struct RuleBasedJobCreator {
    configurations: Arc<dyn JobConfigurationRepository>,
    executions: Arc<dyn JobExecutionRepository>,
    execution_queue: StreamProducer,
}

impl RuleBasedJobCreator {
    pub fn new(
        configurations: Arc<dyn JobConfigurationRepository>,
        executions: Arc<dyn JobExecutionRepository>,
        execution_queue: StreamProducer,
    ) -> Self {
        Self {
            configurations,
            executions,
            execution_queue,
        }
    }
}

#[async_trait]
impl EvalJobCreator for RuleBasedJobCreator {
    async fn create_eval_jobs(&self, job: &TraceUpsertJob) -> EvalResult<usize> {
        let rules = self
            .configurations
            .enabled_for_project(job.project_id)
            .await?;

        let mut created = 0;

        for rule in rules {
            if !sampled(&job.trace_id, rule.id, rule.sampling) {
                debug!(
                    trace_id = %job.trace_id,
                    rule_id = %rule.id,
                    sampling = rule.sampling,
                    "Trace not sampled for rule"
                );
                continue;
            }

            let execution_id = self
                .executions
                .insert_pending(NewJobExecution {
                    project_id: job.project_id,
                    job_configuration_id: Some(rule.id),
                    trace_id: job.trace_id.clone(),
                })
                .await?;

            self.execution_queue
                .send(&EvalExecutionJob::new(execution_id, job.project_id))
                .await
                .map_err(|e| EvalError::Internal(format!("Failed to enqueue eval job: {e}")))?;

            created += 1;
        }

        debug!(
            trace_id = %job.trace_id,
            project_id = %job.project_id,
            created = created,
            "Eval jobs created"
        );

        Ok(created)
    }
}

/// Deterministic sampling: redelivered upserts make the same decision, so
/// at-least-once delivery cannot double-sample a trace.
fn sampled(trace_id: &str, rule_id: Uuid, sampling: f64) -> bool {
    if sampling >= 1.0 {
        return true;
    }
    if sampling <= 0.0 {
        return false;
    }

    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    trace_id.hash(&mut hasher);
    rule_id.hash(&mut hasher);

    let bucket = (hasher.finish() % 10_000) as f64 / 10_000.0;
    bucket < sampling
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_sampling_always_matches() {
        assert!(sampled("trace-1", Uuid::new_v4(), 1.0));
        assert!(sampled("trace-2", Uuid::new_v4(), 1.5));
    }

    #[test]
    fn zero_sampling_never_matches() {
        assert!(!sampled("trace-1", Uuid::new_v4(), 0.0));
        assert!(!sampled("trace-2", Uuid::new_v4(), -0.1));
    }

    #[test]
    fn sampling_is_deterministic_per_trace_and_rule() {
        let rule = Uuid::new_v4();
        let first = sampled("trace-1", rule, 0.5);
        for _ in 0..10 {
            assert_eq!(sampled("trace-1", rule, 0.5), first);
        }
    }

    #[test]
    fn half_sampling_splits_the_population() {
        let rule = Uuid::new_v4();
        let hits = (0..1_000)
            .filter(|i| sampled(&format!("trace-{i}"), rule, 0.5))
            .count();

        // Loose band; the hash is uniform but not seeded.
        assert!((300..=700).contains(&hits), "hits = {hits}");
    }
}
