//! Batch ingestion coordinator.
//!
//! Takes the raw batch array, produces the 207 multi-status body. Every
//! input element lands in exactly one of `successes` or `errors`, keyed by
//! its envelope ID.

use crate::clean::clean_json;
use crate::dispatcher::WorkerDispatcher;
use crate::error::IngestionError;
use crate::events::IngestionEvent;
use crate::processor::ProcessorRegistry;
use crate::repository::IngestionRepository;
use crate::retry::retry_event;
use domain_auth::{AccessLevel, ApiScope};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// One accepted event in the batch response.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BatchSuccess {
    pub id: String,
    pub status: u16,
}

/// One rejected event in the batch response.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BatchError {
    pub id: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchError {
    fn bad_request(id: String, message: String) -> Self {
        Self {
            id,
            status: 400,
            message: Some(message),
            error: Some("BadRequest".to_string()),
        }
    }

    fn from_ingestion_error(id: String, error: &IngestionError) -> Self {
        Self {
            id,
            status: error.status(),
            message: Some(error.to_string()),
            error: Some(error.kind().to_string()),
        }
    }
}

/// The 207 multi-status response body.
#[derive(Debug, Clone, Serialize, Default)]
pub struct BatchResult {
    pub errors: Vec<BatchError>,
    pub successes: Vec<BatchSuccess>,
}

struct ParsedEvent {
    envelope_id: String,
    event: IngestionEvent,
    /// Cleaned raw JSON, kept for the audit log.
    raw: Value,
}

/// Validates, orders, persists, and fans out one batch.
pub struct IngestionCoordinator {
    registry: ProcessorRegistry,
    repo: Arc<dyn IngestionRepository>,
    dispatcher: WorkerDispatcher,
}

impl IngestionCoordinator {
    pub fn new(repo: Arc<dyn IngestionRepository>, dispatcher: WorkerDispatcher) -> Self {
        Self {
            registry: ProcessorRegistry::new(repo.clone()),
            repo,
            dispatcher,
        }
    }

    /// Process one batch to completion. Infallible by construction: every
    /// per-event failure is collected into the result instead of thrown.
    pub async fn process_batch(
        &self,
        scope: &ApiScope,
        batch: Vec<Value>,
        metadata: Option<Value>,
    ) -> BatchResult {
        let mut errors = Vec::new();
        let mut parsed = Vec::with_capacity(batch.len());

        for raw in batch {
            let envelope_id = raw
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string();

            let cleaned = clean_json(raw);

            match serde_json::from_value::<IngestionEvent>(cleaned.clone()) {
                Ok(event) => match event.validate() {
                    Ok(()) => parsed.push(ParsedEvent {
                        envelope_id,
                        event,
                        raw: cleaned,
                    }),
                    Err(e) => errors.push(BatchError::bad_request(envelope_id, e.to_string())),
                },
                Err(e) => errors.push(BatchError::bad_request(envelope_id, e.to_string())),
            }
        }

        let ordered = partition_updates_last(parsed);

        let mut successes = Vec::new();
        let mut trace_ids = Vec::new();

        for item in &ordered {
            let outcome = self.process_event(scope, item, metadata.as_ref()).await;

            record_event_outcome(item.event.event_type(), outcome.is_ok());

            match outcome {
                Ok(processed) => {
                    successes.push(BatchSuccess {
                        id: item.envelope_id.clone(),
                        status: 201,
                    });
                    if item.event.is_trace_create() {
                        trace_ids.push(processed.id);
                    }
                }
                Err(e) => {
                    if e.status() == 500 {
                        observability::trace_exception(&e);
                    }
                    errors.push(BatchError::from_ingestion_error(
                        item.envelope_id.clone(),
                        &e,
                    ));
                }
            }
        }

        debug!(
            successes = successes.len(),
            errors = errors.len(),
            traces = trace_ids.len(),
            "Batch processed"
        );

        // Best effort: a failed notification must not fail the batch.
        self.dispatcher
            .dispatch_trace_upserts(scope.project_id, trace_ids)
            .await;

        BatchResult { errors, successes }
    }

    async fn process_event(
        &self,
        scope: &ApiScope,
        item: &ParsedEvent,
        metadata: Option<&Value>,
    ) -> Result<crate::processor::ProcessedEvent, IngestionError> {
        // Score-only keys fail here, before any processor work. Auth
        // errors are final, so this also never enters the retry loop.
        if scope.access_level != AccessLevel::All && !item.event.is_score_create() {
            return Err(IngestionError::Authentication(format!(
                "Access level '{}' cannot submit {}",
                scope.access_level.as_str(),
                item.event.event_type()
            )));
        }

        let event = &item.event;
        let envelope_id = item.envelope_id.as_str();
        let raw = &item.raw;

        retry_event(|| async move {
            // Audit copy lands before typed processing; its failure aborts
            // this event with a retryable error.
            self.repo
                .log_raw_event(
                    scope.project_id,
                    envelope_id,
                    event.event_type(),
                    raw.clone(),
                    metadata.cloned(),
                )
                .await?;

            self.registry.processor_for(event).process(scope, event).await
        })
        .await
    }
}

/// Stable partition: non-update events first, `OBSERVATION_UPDATE`-family
/// events last, original order preserved within each half. An update in the
/// same batch as its create must land second.
fn partition_updates_last(events: Vec<ParsedEvent>) -> Vec<ParsedEvent> {
    let (updates, creates): (Vec<_>, Vec<_>) = events
        .into_iter()
        .partition(|item| item.event.is_observation_update());

    creates.into_iter().chain(updates).collect()
}

fn record_event_outcome(event_type: &str, success: bool) {
    observability::record_increment(
        "ingestion_events_processed_total",
        1,
        &[
            ("event_type".to_string(), event_type.to_string()),
            (
                "outcome".to_string(),
                if success { "success" } else { "error" }.to_string(),
            ),
        ],
    );
}
