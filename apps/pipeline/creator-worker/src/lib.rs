//! Eval Job Creator Worker
//!
//! Consumes the TraceUpsert stream and materializes evaluation jobs:
//!
//! ```text
//! Ingestion API ──POST /api/events──► this service
//!                                       │ (enqueue)
//!                                       ▼
//!                            Redis Stream (TraceUpsert)
//!                                       │ (consumer group: eval-job-creators)
//!                                       ▼
//!                  StreamWorker<TraceUpsertJob, EvalJobCreatorProcessor>
//!                                       │ one PENDING job execution per rule
//!                                       ▼
//!                         Redis Stream (EvaluationExecution)
//! ```

use axum::Router;
use core_config::pipeline::EvalWorkerSettings;
use core_config::{app_info, env_parsed, Environment, FromEnv};
use database::postgres::PostgresConfig;
use database::redis::RedisConfig;
use domain_evals::{
    EvalExecutionStream, EvalJobCreatorProcessor, PgEvalRepository, RuleBasedJobCreator,
    TraceUpsertJob, TraceUpsertStream,
};
use eyre::{Result, WrapErr};
use std::sync::Arc;
use stream_worker::{health_router, HealthState, StreamProducer, StreamWorker, WorkerConfig};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

mod events;

use events::{events_router, EventsState};

/// Run the creator worker: HTTP receiver plus stream consumer.
pub async fn run() -> Result<()> {
    let environment = Environment::from_env();
    core_config::tracing::init_tracing(&environment);
    observability::init_metrics();

    let app_info = app_info!();
    info!(name = %app_info.name, version = %app_info.version, "Starting eval job creator worker");

    let http_port: u16 = env_parsed("CREATOR_WORKER_HEALTH_PORT", "8082")
        .wrap_err("Invalid CREATOR_WORKER_HEALTH_PORT")?;
    let worker_password = std::env::var("WORKER_PASSWORD").ok();
    let settings = EvalWorkerSettings::from_env().wrap_err("Failed to load worker settings")?;

    let pg_config = PostgresConfig::from_env().wrap_err("Failed to load PostgreSQL configuration")?;
    let db = database::postgres::connect_from_config_with_retry(pg_config, None)
        .await
        .wrap_err("Failed to connect to PostgreSQL")?;

    let redis_config = RedisConfig::from_env().wrap_err("Failed to load Redis configuration")?;
    let redis = database::redis::connect_from_config_with_retry(redis_config, None)
        .await
        .wrap_err("Failed to connect to Redis")?;

    // Keep queue concurrency below the database pool size.
    let worker_config = WorkerConfig::from_stream_def::<TraceUpsertStream>()
        .with_blocking(Some(1_000))
        .with_batch_size(50)
        .with_max_concurrent_jobs(settings.creator_concurrency);
    info!(
        stream = %worker_config.stream_name,
        consumer_group = %worker_config.consumer_group,
        max_concurrent_jobs = %worker_config.max_concurrent_jobs,
        "Worker configuration loaded"
    );

    let repository = Arc::new(PgEvalRepository::new(db));
    let creator = RuleBasedJobCreator::new(
        repository.clone(),
        repository,
        StreamProducer::from_stream_def::<EvalExecutionStream>(redis.clone()),
    );
    let processor = EvalJobCreatorProcessor::new(creator);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        axum_helpers::shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    // HTTP surface: health probes, metrics, and the event receiver.
    let health_state = HealthState::new(
        redis.clone(),
        app_info.name,
        app_info.version,
        worker_config.stream_name.clone(),
    );
    let events_state = EventsState {
        producer: StreamProducer::from_stream_def::<TraceUpsertStream>(redis.clone()),
        password: worker_password,
    };

    let app: Router = health_router(health_state).merge(events_router(events_state));
    tokio::spawn(async move {
        if let Err(e) = serve_http(app, http_port).await {
            error!(error = %e, "Worker HTTP server failed");
        }
    });

    info!("Starting trace-upsert consumer");
    let worker = StreamWorker::<TraceUpsertJob, _>::new(redis, processor, worker_config);
    worker
        .run(shutdown_rx)
        .await
        .map_err(|e| eyre::eyre!("{}", e))?;

    info!("Eval job creator worker stopped");
    Ok(())
}

async fn serve_http(app: Router, port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("Failed to bind worker HTTP server to {}", addr))?;

    info!(port = %port, "Worker HTTP server listening");

    axum::serve(listener, app)
        .await
        .wrap_err("Worker HTTP server failed")?;

    Ok(())
}
