//! Inbound event model.
//!
//! A batch element is a tagged record: `{ "id", "type", "timestamp",
//! "body" }` where `type` selects the payload schema. The `id` is the
//! client-generated event UUID used for idempotency of the envelope; entity
//! IDs live inside the body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// Common envelope around every event body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope<B> {
    /// Client-supplied event UUID.
    pub id: String,
    /// Client-side event time.
    pub timestamp: DateTime<Utc>,
    pub body: B,
}

/// Severity attached to observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObservationLevel {
    Debug,
    Default,
    Warning,
    Error,
}

impl ObservationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Default => "DEFAULT",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

/// Concrete observation shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObservationKind {
    Span,
    Generation,
    Event,
}

impl ObservationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Span => "SPAN",
            Self::Generation => "GENERATION",
            Self::Event => "EVENT",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TraceBody {
    /// Client-assigned trace ID; generated server-side when absent.
    pub id: Option<String>,
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

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ObservationBody {
    /// Observation ID. Update events may address it as `observationId`.
    #[serde(alias = "observationId")]
    pub id: Option<String>,
    pub trace_id: Option<String>,
    /// Explicit shape for the legacy `OBSERVATION_*` event types; the
    /// typed event kinds (`SPAN_*` etc.) override it.
    #[serde(rename = "type")]
    pub kind: Option<ObservationKind>,
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

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBody {
    pub id: Option<String>,
    pub trace_id: String,
    #[validate(length(min = 1, message = "score name must not be empty"))]
    pub name: String,
    pub value: f64,
    pub observation_id: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkLogBody {
    pub log: Value,
}

/// The closed set of inbound event types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IngestionEvent {
    #[serde(rename = "TRACE_CREATE")]
    TraceCreate(EventEnvelope<TraceBody>),
    #[serde(rename = "OBSERVATION_CREATE")]
    ObservationCreate(EventEnvelope<ObservationBody>),
    #[serde(rename = "OBSERVATION_UPDATE")]
    ObservationUpdate(EventEnvelope<ObservationBody>),
    #[serde(rename = "SPAN_CREATE")]
    SpanCreate(EventEnvelope<ObservationBody>),
    #[serde(rename = "SPAN_UPDATE")]
    SpanUpdate(EventEnvelope<ObservationBody>),
    #[serde(rename = "GENERATION_CREATE")]
    GenerationCreate(EventEnvelope<ObservationBody>),
    #[serde(rename = "GENERATION_UPDATE")]
    GenerationUpdate(EventEnvelope<ObservationBody>),
    #[serde(rename = "EVENT_CREATE")]
    EventCreate(EventEnvelope<ObservationBody>),
    #[serde(rename = "SCORE_CREATE")]
    ScoreCreate(EventEnvelope<ScoreBody>),
    #[serde(rename = "SDK_LOG")]
    SdkLog(EventEnvelope<SdkLogBody>),
}

impl IngestionEvent {
    /// The envelope's client event UUID.
    pub fn event_id(&self) -> &str {
        match self {
            Self::TraceCreate(e) => &e.id,
            Self::ObservationCreate(e)
            | Self::ObservationUpdate(e)
            | Self::SpanCreate(e)
            | Self::SpanUpdate(e)
            | Self::GenerationCreate(e)
            | Self::GenerationUpdate(e)
            | Self::EventCreate(e) => &e.id,
            Self::ScoreCreate(e) => &e.id,
            Self::SdkLog(e) => &e.id,
        }
    }

    /// Wire name of the event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::TraceCreate(_) => "TRACE_CREATE",
            Self::ObservationCreate(_) => "OBSERVATION_CREATE",
            Self::ObservationUpdate(_) => "OBSERVATION_UPDATE",
            Self::SpanCreate(_) => "SPAN_CREATE",
            Self::SpanUpdate(_) => "SPAN_UPDATE",
            Self::GenerationCreate(_) => "GENERATION_CREATE",
            Self::GenerationUpdate(_) => "GENERATION_UPDATE",
            Self::EventCreate(_) => "EVENT_CREATE",
            Self::ScoreCreate(_) => "SCORE_CREATE",
            Self::SdkLog(_) => "SDK_LOG",
        }
    }

    pub fn is_trace_create(&self) -> bool {
        matches!(self, Self::TraceCreate(_))
    }

    pub fn is_score_create(&self) -> bool {
        matches!(self, Self::ScoreCreate(_))
    }

    /// Updates must process after creates within one batch.
    pub fn is_observation_update(&self) -> bool {
        matches!(
            self,
            Self::ObservationUpdate(_) | Self::SpanUpdate(_) | Self::GenerationUpdate(_)
        )
    }

    /// The observation shape implied by the event type, if this is an
    /// observation event. Legacy `OBSERVATION_*` types defer to the body.
    pub fn observation_kind(&self) -> Option<ObservationKind> {
        match self {
            Self::SpanCreate(_) | Self::SpanUpdate(_) => Some(ObservationKind::Span),
            Self::GenerationCreate(_) | Self::GenerationUpdate(_) => {
                Some(ObservationKind::Generation)
            }
            Self::EventCreate(_) => Some(ObservationKind::Event),
            Self::ObservationCreate(e) | Self::ObservationUpdate(e) => {
                Some(e.body.kind.unwrap_or(ObservationKind::Event))
            }
            _ => None,
        }
    }

    /// Re-validate the (cleaned) body against its schema constraints.
    pub fn validate(&self) -> Result<(), validator::ValidationErrors> {
        match self {
            Self::TraceCreate(e) => e.body.validate(),
            Self::ObservationCreate(e)
            | Self::ObservationUpdate(e)
            | Self::SpanCreate(e)
            | Self::SpanUpdate(e)
            | Self::GenerationCreate(e)
            | Self::GenerationUpdate(e)
            | Self::EventCreate(e) => e.body.validate(),
            Self::ScoreCreate(e) => e.body.validate(),
            Self::SdkLog(_) => Ok(()),
        }
    }
}
