//! Ingestion API service.
//!
//! Accepts SDK telemetry batches on `POST /api/public/ingestion`, persists
//! them, and notifies the evaluation worker service about trace upserts.

use axum::{middleware, routing::get, Router};
use axum_helpers::server::{create_app_with_cleanup, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use core_config::app_info;
use std::time::Duration;
use tracing::info;

mod config;
mod routes;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);
    observability::init_metrics();

    let app_info = app_info!();
    info!(name = %app_info.name, version = %app_info.version, "Starting ingestion API");

    let postgres_future = async {
        database::postgres::connect_from_config_with_retry(config.database.clone(), None)
            .await
            .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))
    };

    let redis_future = async {
        database::redis::connect_from_config_with_retry(config.redis.clone(), None)
            .await
            .map_err(|e| eyre::eyre!("Redis connection failed: {}", e))
    };

    let (db, redis) = tokio::try_join!(postgres_future, redis_future)?;

    database::postgres::run_migrations::<migration::Migrator>(&db, app_info.name)
        .await
        .map_err(|e| eyre::eyre!("Migration failed: {}", e))?;

    let state = AppState { config, db, redis };

    let metrics_router = Router::new().route("/metrics", get(observability::metrics_handler));

    let app = Router::new()
        .nest("/api", routes::api_routes(&state))
        .layer(axum_helpers::middleware::ingestion_cors())
        .layer(middleware::from_fn(
            observability::middleware::metrics_middleware,
        ))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .merge(health_router(app_info))
        .merge(routes::ready_router(state.clone()))
        .merge(metrics_router)
        .fallback(axum_helpers::errors::not_found);

    let server_config = state.config.server.clone();

    create_app_with_cleanup(app, &server_config, Duration::from_secs(30), async move {
        info!("Shutting down: closing connections");
        tokio::join!(
            async {
                match state.db.close().await {
                    Ok(_) => info!("PostgreSQL connection closed"),
                    Err(e) => tracing::error!("Error closing PostgreSQL: {}", e),
                }
            },
            async {
                // The Redis ConnectionManager closes on drop.
                drop(state.redis);
                info!("Redis connection closed");
            }
        );
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Ingestion API shutdown complete");
    Ok(())
}
