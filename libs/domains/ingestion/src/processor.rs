//! Per-type event processors and their registry.
//!
//! Each processor re-validates the cleaned event, repeats the scope check
//! the middleware already performed, and upserts its entity idempotently by
//! `(project_id, id)`.

use crate::error::{IngestionError, IngestionResult};
use crate::events::{IngestionEvent, ObservationKind};
use crate::repository::{IngestionRepository, ObservationRecord, ScoreRecord, TraceRecord};
use async_trait::async_trait;
use domain_auth::{AccessLevel, ApiScope};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// What kind of entity a processed event produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessedEntity {
    Trace,
    Observation,
    Score,
    SdkLog,
}

/// Result of processing one event: the persisted entity's ID.
#[derive(Debug, Clone)]
pub struct ProcessedEvent {
    pub id: String,
    pub entity: ProcessedEntity,
}

/// Uniform per-event handler contract.
#[async_trait]
pub trait EventProcessor: Send + Sync {
    async fn process(
        &self,
        scope: &ApiScope,
        event: &IngestionEvent,
    ) -> IngestionResult<ProcessedEvent>;
}

fn require_full_access(scope: &ApiScope, event: &IngestionEvent) -> IngestionResult<()> {
    if scope.access_level != AccessLevel::All {
        return Err(IngestionError::Authentication(format!(
            "Access level '{}' cannot submit {}",
            scope.access_level.as_str(),
            event.event_type()
        )));
    }
    Ok(())
}

pub struct TraceProcessor {
    repo: Arc<dyn IngestionRepository>,
}

#[async_trait]
impl EventProcessor for TraceProcessor {
    async fn process(
        &self,
        scope: &ApiScope,
        event: &IngestionEvent,
    ) -> IngestionResult<ProcessedEvent> {
        let IngestionEvent::TraceCreate(envelope) = event else {
            return Err(IngestionError::Internal(format!(
                "Trace processor received {}",
                event.event_type()
            )));
        };

        event.validate()?;
        require_full_access(scope, event)?;

        let body = &envelope.body;
        let record = TraceRecord {
            id: body
                .id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            timestamp: envelope.timestamp,
            name: body.name.clone(),
            user_id: body.user_id.clone(),
            session_id: body.session_id.clone(),
            release: body.release.clone(),
            version: body.version.clone(),
            input: body.input.clone(),
            output: body.output.clone(),
            metadata: body.metadata.clone(),
            tags: body.tags.clone(),
            public: body.public,
        };

        let id = self.repo.upsert_trace(scope.project_id, record).await?;
        info!(trace_id = %id, project_id = %scope.project_id, "Upserted trace");

        Ok(ProcessedEvent {
            id,
            entity: ProcessedEntity::Trace,
        })
    }
}

pub struct ObservationProcessor {
    repo: Arc<dyn IngestionRepository>,
}

#[async_trait]
impl EventProcessor for ObservationProcessor {
    async fn process(
        &self,
        scope: &ApiScope,
        event: &IngestionEvent,
    ) -> IngestionResult<ProcessedEvent> {
        let envelope = match event {
            IngestionEvent::ObservationCreate(e)
            | IngestionEvent::ObservationUpdate(e)
            | IngestionEvent::SpanCreate(e)
            | IngestionEvent::SpanUpdate(e)
            | IngestionEvent::GenerationCreate(e)
            | IngestionEvent::GenerationUpdate(e)
            | IngestionEvent::EventCreate(e) => e,
            other => {
                return Err(IngestionError::Internal(format!(
                    "Observation processor received {}",
                    other.event_type()
                )))
            }
        };

        event.validate()?;
        require_full_access(scope, event)?;

        let body = &envelope.body;
        let record = ObservationRecord {
            id: body
                .id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            trace_id: body.trace_id.clone(),
            kind: event.observation_kind().unwrap_or(ObservationKind::Event),
            name: body.name.clone(),
            start_time: body.start_time,
            end_time: body.end_time,
            parent_observation_id: body.parent_observation_id.clone(),
            level: body.level,
            status_message: body.status_message.clone(),
            model: body.model.clone(),
            input: body.input.clone(),
            output: body.output.clone(),
            metadata: body.metadata.clone(),
        };

        let id = self
            .repo
            .upsert_observation(scope.project_id, record, event.is_observation_update())
            .await?;

        Ok(ProcessedEvent {
            id,
            entity: ProcessedEntity::Observation,
        })
    }
}

pub struct ScoreProcessor {
    repo: Arc<dyn IngestionRepository>,
}

#[async_trait]
impl EventProcessor for ScoreProcessor {
    async fn process(
        &self,
        scope: &ApiScope,
        event: &IngestionEvent,
    ) -> IngestionResult<ProcessedEvent> {
        let IngestionEvent::ScoreCreate(envelope) = event else {
            return Err(IngestionError::Internal(format!(
                "Score processor received {}",
                event.event_type()
            )));
        };

        // Score-only keys exist precisely for this event type.
        event.validate()?;

        let body = &envelope.body;
        let record = ScoreRecord {
            id: body
                .id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            trace_id: body.trace_id.clone(),
            observation_id: body.observation_id.clone(),
            name: body.name.clone(),
            value: body.value,
            comment: body.comment.clone(),
            timestamp: envelope.timestamp,
        };

        let id = self.repo.upsert_score(scope.project_id, record).await?;

        Ok(ProcessedEvent {
            id,
            entity: ProcessedEntity::Score,
        })
    }
}

/// SDK logs are diagnostics from client libraries; they are kept in the raw
/// audit log and surfaced to operators, not persisted as domain entities.
pub struct SdkLogProcessor;

#[async_trait]
impl EventProcessor for SdkLogProcessor {
    async fn process(
        &self,
        scope: &ApiScope,
        event: &IngestionEvent,
    ) -> IngestionResult<ProcessedEvent> {
        let IngestionEvent::SdkLog(envelope) = event else {
            return Err(IngestionError::Internal(format!(
                "SDK log processor received {}",
                event.event_type()
            )));
        };

        warn!(
            project_id = %scope.project_id,
            log = %envelope.body.log,
            "SDK log event"
        );

        Ok(ProcessedEvent {
            id: envelope.id.clone(),
            entity: ProcessedEntity::SdkLog,
        })
    }
}

/// Routes an event to its processor by type.
pub struct ProcessorRegistry {
    trace: TraceProcessor,
    observation: ObservationProcessor,
    score: ScoreProcessor,
    sdk_log: SdkLogProcessor,
}

impl ProcessorRegistry {
    pub fn new(repo: Arc<dyn IngestionRepository>) -> Self {
        Self {
            trace: TraceProcessor { repo: repo.clone() },
            observation: ObservationProcessor { repo: repo.clone() },
            score: ScoreProcessor { repo },
            sdk_log: SdkLogProcessor,
        }
    }

    pub fn processor_for(&self, event: &IngestionEvent) -> &dyn EventProcessor {
        match event {
            IngestionEvent::TraceCreate(_) => &self.trace,
            IngestionEvent::ObservationCreate(_)
            | IngestionEvent::ObservationUpdate(_)
            | IngestionEvent::SpanCreate(_)
            | IngestionEvent::SpanUpdate(_)
            | IngestionEvent::GenerationCreate(_)
            | IngestionEvent::GenerationUpdate(_)
            | IngestionEvent::EventCreate(_) => &self.observation,
            IngestionEvent::ScoreCreate(_) => &self.score,
            IngestionEvent::SdkLog(_) => &self.sdk_log,
        }
    }
}
