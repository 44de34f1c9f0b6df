//! Trace-upsert event receiver.
//!
//! The ingestion API posts `[{traceId, projectId}, ...]` here with Basic
//! auth `server:<WORKER_PASSWORD>`; each element becomes one job on the
//! TraceUpsert stream.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use axum_extra::headers::{authorization::Basic, Authorization};
use axum_extra::TypedHeader;
use domain_evals::TraceUpsertJob;
use serde::Deserialize;
use serde_json::json;
use stream_worker::StreamProducer;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct EventsState {
    pub producer: StreamProducer,
    /// Shared secret; unset refuses all notifications.
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TraceUpsertRequest {
    trace_id: String,
    project_id: Uuid,
}

async fn receive_events(
    State(state): State<EventsState>,
    auth: Option<TypedHeader<Authorization<Basic>>>,
    Json(items): Json<Vec<TraceUpsertRequest>>,
) -> Response {
    let authorized = match (&state.password, &auth) {
        (Some(password), Some(TypedHeader(basic))) => {
            basic.username() == "server" && basic.password() == password
        }
        _ => false,
    };

    if !authorized {
        warn!("Rejected unauthenticated trace-upsert notification");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Unauthorized" })),
        )
            .into_response();
    }

    let jobs: Vec<TraceUpsertJob> = items
        .iter()
        .map(|item| TraceUpsertJob::new(item.trace_id.clone(), item.project_id))
        .collect();

    match state.producer.send_batch(&jobs).await {
        Ok(message_ids) => {
            info!(count = message_ids.len(), "Queued trace-upsert jobs");
            (
                StatusCode::CREATED,
                Json(json!({ "queued": message_ids.len() })),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to queue trace-upsert jobs");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to queue jobs" })),
            )
                .into_response()
        }
    }
}

/// Router for `POST /api/events`.
pub fn events_router(state: EventsState) -> Router {
    Router::new()
        .route("/api/events", post(receive_events))
        .with_state(state)
}
