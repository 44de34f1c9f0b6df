//! PostgreSQL implementation of the ingestion repository.

use crate::entity::{ingestion_log, observations, scores, traces};
use crate::error::IngestionResult;
use crate::events::ObservationLevel;
use crate::repository::{IngestionRepository, ObservationRecord, ScoreRecord, TraceRecord};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait};
use serde_json::Value;
use uuid::Uuid;

pub struct PgIngestionRepository {
    db: DatabaseConnection,
}

impl PgIngestionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IngestionRepository for PgIngestionRepository {
    async fn log_raw_event(
        &self,
        project_id: Uuid,
        event_id: &str,
        event_type: &str,
        payload: Value,
        metadata: Option<Value>,
    ) -> IngestionResult<()> {
        let row = ingestion_log::ActiveModel {
            event_id: Set(event_id.to_string()),
            project_id: Set(project_id),
            event_type: Set(event_type.to_string()),
            payload: Set(payload),
            metadata: Set(metadata),
            received_at: Set(Utc::now().into()),
        };

        // Replayed envelopes keep the first audit row.
        ingestion_log::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    ingestion_log::Column::EventId,
                    ingestion_log::Column::ProjectId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }

    async fn upsert_trace(
        &self,
        project_id: Uuid,
        record: TraceRecord,
    ) -> IngestionResult<String> {
        let existing = traces::Entity::find_by_id((record.id.clone(), project_id))
            .one(&self.db)
            .await?;

        let now = Utc::now();
        let tags_json = record
            .tags
            .as_ref()
            .map(|t| serde_json::to_value(t).unwrap_or(Value::Null));

        match existing {
            Some(current) => {
                let mut model: traces::ActiveModel = current.clone().into();
                model.timestamp = Set(record.timestamp.into());
                if record.name.is_some() {
                    model.name = Set(record.name);
                }
                if record.user_id.is_some() {
                    model.user_id = Set(record.user_id);
                }
                if record.session_id.is_some() {
                    model.session_id = Set(record.session_id);
                }
                if record.release.is_some() {
                    model.release = Set(record.release);
                }
                if record.version.is_some() {
                    model.version = Set(record.version);
                }
                if record.input.is_some() {
                    model.input = Set(record.input);
                }
                if record.output.is_some() {
                    model.output = Set(record.output);
                }
                if record.metadata.is_some() {
                    model.metadata = Set(record.metadata);
                }
                if tags_json.is_some() {
                    model.tags = Set(tags_json);
                }
                if let Some(public) = record.public {
                    model.public = Set(public);
                }
                model.updated_at = Set(now.into());

                let updated = model.update(&self.db).await?;
                tracing::debug!(trace_id = %updated.id, "Updated trace");
                Ok(updated.id)
            }
            None => {
                let model = traces::ActiveModel {
                    id: Set(record.id.clone()),
                    project_id: Set(project_id),
                    timestamp: Set(record.timestamp.into()),
                    name: Set(record.name),
                    user_id: Set(record.user_id),
                    session_id: Set(record.session_id),
                    release: Set(record.release),
                    version: Set(record.version),
                    input: Set(record.input),
                    output: Set(record.output),
                    metadata: Set(record.metadata),
                    tags: Set(tags_json),
                    public: Set(record.public.unwrap_or(false)),
                    created_at: Set(now.into()),
                    updated_at: Set(now.into()),
                };

                let inserted = model.insert(&self.db).await?;
                tracing::debug!(trace_id = %inserted.id, "Created trace");
                Ok(inserted.id)
            }
        }
    }

    async fn upsert_observation(
        &self,
        project_id: Uuid,
        record: ObservationRecord,
        is_update: bool,
    ) -> IngestionResult<String> {
        let existing = observations::Entity::find_by_id((record.id.clone(), project_id))
            .one(&self.db)
            .await?;

        let now = Utc::now();

        match existing {
            Some(current) => {
                let mut model: observations::ActiveModel = current.clone().into();
                model.kind = Set(record.kind.as_str().to_string());
                if record.trace_id.is_some() {
                    model.trace_id = Set(record.trace_id);
                }
                if record.name.is_some() {
                    model.name = Set(record.name);
                }
                if record.start_time.is_some() {
                    model.start_time = Set(record.start_time.map(Into::into));
                }
                if record.end_time.is_some() {
                    model.end_time = Set(record.end_time.map(Into::into));
                }
                if record.parent_observation_id.is_some() {
                    model.parent_observation_id = Set(record.parent_observation_id);
                }
                if let Some(level) = record.level {
                    model.level = Set(level.as_str().to_string());
                }
                if record.status_message.is_some() {
                    model.status_message = Set(record.status_message);
                }
                if record.model.is_some() {
                    model.model = Set(record.model);
                }
                if record.input.is_some() {
                    model.input = Set(record.input);
                }
                if record.output.is_some() {
                    model.output = Set(record.output);
                }
                if record.metadata.is_some() {
                    model.metadata = Set(record.metadata);
                }
                model.updated_at = Set(now.into());

                let updated = model.update(&self.db).await?;
                tracing::debug!(observation_id = %updated.id, "Updated observation");
                Ok(updated.id)
            }
            None => {
                // Updates may arrive before their create (cross-batch); an
                // upsert keeps them from failing and the later create merges.
                if is_update {
                    tracing::debug!(
                        observation_id = %record.id,
                        "Update for unseen observation, inserting"
                    );
                }

                let model = observations::ActiveModel {
                    id: Set(record.id.clone()),
                    project_id: Set(project_id),
                    trace_id: Set(record.trace_id),
                    kind: Set(record.kind.as_str().to_string()),
                    name: Set(record.name),
                    start_time: Set(record.start_time.map(Into::into)),
                    end_time: Set(record.end_time.map(Into::into)),
                    parent_observation_id: Set(record.parent_observation_id),
                    level: Set(record
                        .level
                        .unwrap_or(ObservationLevel::Default)
                        .as_str()
                        .to_string()),
                    status_message: Set(record.status_message),
                    model: Set(record.model),
                    input: Set(record.input),
                    output: Set(record.output),
                    metadata: Set(record.metadata),
                    created_at: Set(now.into()),
                    updated_at: Set(now.into()),
                };

                let inserted = model.insert(&self.db).await?;
                tracing::debug!(observation_id = %inserted.id, "Created observation");
                Ok(inserted.id)
            }
        }
    }

    async fn upsert_score(
        &self,
        project_id: Uuid,
        record: ScoreRecord,
    ) -> IngestionResult<String> {
        let existing = scores::Entity::find_by_id((record.id.clone(), project_id))
            .one(&self.db)
            .await?;

        match existing {
            Some(current) => {
                let mut model: scores::ActiveModel = current.into();
                model.trace_id = Set(record.trace_id);
                model.observation_id = Set(record.observation_id);
                model.name = Set(record.name);
                model.value = Set(record.value);
                model.comment = Set(record.comment);
                model.timestamp = Set(record.timestamp.into());

                let updated = model.update(&self.db).await?;
                Ok(updated.id)
            }
            None => {
                let model = scores::ActiveModel {
                    id: Set(record.id.clone()),
                    project_id: Set(project_id),
                    trace_id: Set(record.trace_id),
                    observation_id: Set(record.observation_id),
                    name: Set(record.name),
                    value: Set(record.value),
                    comment: Set(record.comment),
                    timestamp: Set(record.timestamp.into()),
                };

                let inserted = model.insert(&self.db).await?;
                tracing::debug!(score_id = %inserted.id, "Created score");
                Ok(inserted.id)
            }
        }
    }
}
