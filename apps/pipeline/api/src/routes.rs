//! Route assembly for the ingestion API.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use domain_auth::{AuthState, PgApiKeyVerifier, RateLimitResource, RateLimitService};
use domain_ingestion::{
    ingestion_router, IngestionCoordinator, IngestionState, PgIngestionRepository,
    WorkerDispatcher,
};
use serde_json::json;
use std::sync::Arc;

/// Build the `/api` routes: the public ingestion surface behind
/// auth + rate limiting.
pub fn api_routes(state: &AppState) -> Router {
    let repo = Arc::new(PgIngestionRepository::new(state.db.clone()));
    let dispatcher = WorkerDispatcher::new(state.config.worker.clone());

    let ingestion_state = IngestionState {
        coordinator: Arc::new(IngestionCoordinator::new(repo, dispatcher)),
    };

    let auth = AuthState::new(
        Arc::new(PgApiKeyVerifier::new(state.db.clone())),
        RateLimitService::new(state.redis.clone(), state.config.cloud.is_cloud()),
        RateLimitResource::Ingestion,
    );

    ingestion_router(ingestion_state, auth)
}

async fn ready_handler(State(state): State<AppState>) -> impl IntoResponse {
    let (db, redis) = tokio::join!(
        database::postgres::check_postgres(&state.db),
        database::redis::check_redis(&state.redis),
    );

    let db_ok = db.is_ok();
    let redis_ok = redis.is_ok();

    let status = if db_ok && redis_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "ready": db_ok && redis_ok,
            "services": { "database": db_ok, "cache": redis_ok },
        })),
    )
}

/// Readiness probe backed by live connection checks.
pub fn ready_router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(ready_handler))
        .route("/readyz", get(ready_handler))
        .with_state(state)
}
