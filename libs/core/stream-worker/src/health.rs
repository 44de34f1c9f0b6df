//! Health and metrics HTTP endpoints for worker processes.
//!
//! Workers have no API surface of their own, so each runs a small axum
//! server exposing liveness/readiness probes and Prometheus metrics.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use redis::aio::ConnectionManager;
use serde_json::json;

/// Shared state for worker health endpoints.
#[derive(Clone)]
pub struct HealthState {
    pub redis: ConnectionManager,
    pub name: &'static str,
    pub version: &'static str,
    pub stream_name: String,
}

impl HealthState {
    pub fn new(
        redis: ConnectionManager,
        name: &'static str,
        version: &'static str,
        stream_name: impl Into<String>,
    ) -> Self {
        Self {
            redis,
            name,
            version,
            stream_name: stream_name.into(),
        }
    }
}

async fn health_handler(State(state): State<HealthState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "name": state.name,
        "version": state.version,
        "stream": state.stream_name,
    }))
}

async fn ready_handler(State(state): State<HealthState>) -> impl IntoResponse {
    let mut conn = state.redis.clone();
    let ping: Result<String, _> = redis::cmd("PING").query_async(&mut conn).await;

    match ping {
        Ok(_) => (StatusCode::OK, Json(json!({ "ready": true }))),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "ready": false, "error": e.to_string() })),
        ),
    }
}

async fn metrics_handler() -> String {
    observability::metrics_handler().await
}

/// Router with `/health`, `/healthz`, `/ready`, `/readyz`, and `/metrics`.
pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/healthz", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/readyz", get(ready_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}
