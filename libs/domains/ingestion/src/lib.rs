//! Telemetry batch ingestion.
//!
//! SDKs submit heterogeneous event batches (traces, observations, scores,
//! SDK logs) to one endpoint. The coordinator validates and scrubs each
//! event, persists it idempotently through a per-type processor, answers
//! with a 207 multi-status body, and fans successful trace creates out to
//! the evaluation worker service.

pub mod clean;
pub mod coordinator;
pub mod dispatcher;
pub mod entity;
pub mod error;
pub mod events;
pub mod handlers;
pub mod postgres;
pub mod processor;
pub mod repository;
pub mod retry;

pub use clean::clean_json;
pub use coordinator::{BatchError, BatchResult, BatchSuccess, IngestionCoordinator};
pub use dispatcher::{TraceUpsertNotification, WorkerDispatcher};
pub use error::{IngestionError, IngestionResult};
pub use events::{IngestionEvent, ObservationKind, ObservationLevel};
pub use handlers::{ingestion_router, IngestionState, MAX_BODY_BYTES};
pub use postgres::PgIngestionRepository;
pub use processor::{EventProcessor, ProcessedEntity, ProcessedEvent, ProcessorRegistry};
pub use repository::IngestionRepository;
