//! PostgreSQL implementation of the evaluation repositories.

use crate::entity::job_configurations;
use crate::entity::job_executions::{self, JobExecutionStatus};
use crate::error::EvalResult;
use crate::repository::{
    JobConfiguration, JobConfigurationRepository, JobExecution, JobExecutionRepository,
    NewJobExecution,
};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use tracing::{debug, warn};
use uuid::Uuid;

pub struct PgEvalRepository {
    db: DatabaseConnection,
}

impl PgEvalRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_row(
        &self,
        id: Uuid,
        project_id: Uuid,
    ) -> EvalResult<Option<job_executions::Model>> {
        let row = job_executions::Entity::find_by_id(id)
            .filter(job_executions::Column::ProjectId.eq(project_id))
            .one(&self.db)
            .await?;
        Ok(row)
    }
}

#[async_trait]
impl JobConfigurationRepository for PgEvalRepository {
    async fn enabled_for_project(&self, project_id: Uuid) -> EvalResult<Vec<JobConfiguration>> {
        let rows = job_configurations::Entity::find()
            .filter(job_configurations::Column::ProjectId.eq(project_id))
            .filter(job_configurations::Column::Enabled.eq(true))
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| JobConfiguration {
                id: row.id,
                project_id: row.project_id,
                evaluator: row.evaluator,
                sampling: row.sampling,
            })
            .collect())
    }
}

#[async_trait]
impl JobExecutionRepository for PgEvalRepository {
    async fn insert_pending(&self, execution: NewJobExecution) -> EvalResult<Uuid> {
        let now = Utc::now();
        let model = job_executions::ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(execution.project_id),
            job_configuration_id: Set(execution.job_configuration_id),
            trace_id: Set(execution.trace_id),
            status: Set(JobExecutionStatus::Pending),
            start_time: Set(Some(now.into())),
            end_time: Set(None),
            error: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let inserted = model.insert(&self.db).await?;
        debug!(job_execution_id = %inserted.id, "Created pending job execution");
        Ok(inserted.id)
    }

    async fn find(&self, id: Uuid, project_id: Uuid) -> EvalResult<Option<JobExecution>> {
        let row = self.find_row(id, project_id).await?;

        Ok(row.map(|row| JobExecution {
            id: row.id,
            project_id: row.project_id,
            trace_id: row.trace_id,
            status: row.status,
            end_time: row.end_time.map(Into::into),
            error: row.error,
        }))
    }

    async fn mark_completed(&self, id: Uuid, project_id: Uuid) -> EvalResult<()> {
        let now = Utc::now();
        let update = job_executions::ActiveModel {
            status: Set(JobExecutionStatus::Completed),
            end_time: Set(Some(now.into())),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        // One conditional UPDATE: only a PENDING row transitions, so a
        // duplicate delivery can never overwrite a terminal status.
        let result = job_executions::Entity::update_many()
            .set(update)
            .filter(job_executions::Column::Id.eq(id))
            .filter(job_executions::Column::ProjectId.eq(project_id))
            .filter(job_executions::Column::Status.eq(JobExecutionStatus::Pending))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            debug!(
                job_execution_id = %id,
                "No pending job execution to complete (missing or already terminal)"
            );
        }

        Ok(())
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        project_id: Uuid,
        display_error: &str,
    ) -> EvalResult<()> {
        let now = Utc::now();
        let update = job_executions::ActiveModel {
            status: Set(JobExecutionStatus::Error),
            end_time: Set(Some(now.into())),
            error: Set(Some(display_error.to_string())),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        let result = job_executions::Entity::update_many()
            .set(update)
            .filter(job_executions::Column::Id.eq(id))
            .filter(job_executions::Column::ProjectId.eq(project_id))
            .filter(job_executions::Column::Status.eq(JobExecutionStatus::Pending))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            warn!(
                job_execution_id = %id,
                "Failure for missing or already-terminal job execution"
            );
        } else {
            debug!(job_execution_id = %id, "Recorded job execution failure");
        }

        Ok(())
    }
}
