//! HTTP surface: `POST /api/public/ingestion`.

use crate::coordinator::IngestionCoordinator;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Extension, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use axum_helpers::AppError;
use domain_auth::{auth_and_rate_limit, ApiScope, AuthState};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// SDK batch uploads are capped at 4.5 MB.
pub const MAX_BODY_BYTES: usize = 4_500_000;

/// Shared state for the ingestion routes.
#[derive(Clone)]
pub struct IngestionState {
    pub coordinator: Arc<IngestionCoordinator>,
}

#[derive(Debug, Deserialize)]
struct IngestionEnvelope {
    batch: Vec<Value>,
    #[serde(default)]
    metadata: Option<Value>,
}

/// Batch ingestion endpoint.
///
/// Envelope-level failures short-circuit with a single status; once the
/// per-event stage is reached the response is always 207.
async fn ingestion_handler(
    State(state): State<IngestionState>,
    Extension(scope): Extension<ApiScope>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(value) = match payload {
        Ok(json) => json,
        Err(rejection) => return AppError::from(rejection).into_response(),
    };

    let envelope: IngestionEnvelope = match serde_json::from_value(value) {
        Ok(envelope) => envelope,
        Err(e) => {
            return AppError::BadRequest(format!("Invalid request data: {e}")).into_response();
        }
    };

    let result = state
        .coordinator
        .process_batch(&scope, envelope.batch, envelope.metadata)
        .await;

    (StatusCode::MULTI_STATUS, Json(result)).into_response()
}

/// Router for the public ingestion surface.
///
/// Auth + rate limiting guard the POST handler only, so non-POST methods
/// still get their 405 from axum's method routing. The body limit enforces
/// the payload cap before any parsing.
pub fn ingestion_router(state: IngestionState, auth: AuthState) -> Router {
    Router::new()
        .route(
            "/public/ingestion",
            post(ingestion_handler)
                .route_layer(middleware::from_fn_with_state(auth, auth_and_rate_limit)),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
