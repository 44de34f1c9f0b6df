//! Persistence interface for the ingestion processors.

use crate::error::IngestionResult;
use crate::events::{ObservationKind, ObservationLevel};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

/// Domain-level trace write.
#[derive(Debug, Clone)]
pub struct TraceRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub name: Option<String>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub release: Option<String>,
    pub version: Option<String>,
    pub input: Option<Value>,
    pub output: Option<Value>,
    pub metadata: Option<Value>,
    pub tags: Option<Vec<String>>,
    pub public: Option<bool>,
}

/// Domain-level observation write.
#[derive(Debug, Clone)]
pub struct ObservationRecord {
    pub id: String,
    pub trace_id: Option<String>,
    pub kind: ObservationKind,
    pub name: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub parent_observation_id: Option<String>,
    pub level: Option<ObservationLevel>,
    pub status_message: Option<String>,
    pub model: Option<String>,
    pub input: Option<Value>,
    pub output: Option<Value>,
    pub metadata: Option<Value>,
}

/// Domain-level score write.
#[derive(Debug, Clone)]
pub struct ScoreRecord {
    pub id: String,
    pub trace_id: String,
    pub observation_id: Option<String>,
    pub name: String,
    pub value: f64,
    pub comment: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Storage operations used by the processors.
///
/// Every upsert is idempotent on `(project_id, id)`: replays converge on
/// the same row, and update events merge their non-null fields over what is
/// already persisted (last writer wins).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IngestionRepository: Send + Sync {
    /// Raw audit write, performed before typed processing of each event.
    async fn log_raw_event(
        &self,
        project_id: Uuid,
        event_id: &str,
        event_type: &str,
        payload: Value,
        metadata: Option<Value>,
    ) -> IngestionResult<()>;

    /// Upsert a trace; returns the persisted trace ID.
    async fn upsert_trace(&self, project_id: Uuid, record: TraceRecord)
        -> IngestionResult<String>;

    /// Upsert an observation; `is_update` selects merge semantics.
    async fn upsert_observation(
        &self,
        project_id: Uuid,
        record: ObservationRecord,
        is_update: bool,
    ) -> IngestionResult<String>;

    /// Upsert a score; returns the persisted score ID.
    async fn upsert_score(&self, project_id: Uuid, record: ScoreRecord)
        -> IngestionResult<String>;
}
