//! Eval Executor Worker
//!
//! Consumes the EvaluationExecution stream:
//!
//! ```text
//! Redis Stream (EvaluationExecution)
//!   │ (consumer group: eval-executors)
//!   ▼
//! StreamWorker<EvalExecutionJob, EvalExecutorProcessor>
//!   │ ok: job_executions → COMPLETED
//!   └ err: job_executions → ERROR (+ re-throw for redelivery)
//! ```

use core_config::pipeline::EvalWorkerSettings;
use core_config::{app_info, env_parsed, Environment, FromEnv};
use database::postgres::PostgresConfig;
use database::redis::RedisConfig;
use domain_evals::{
    EvalExecutionJob, EvalExecutionStream, EvalExecutorProcessor, NoopEvaluator, PgEvalRepository,
};
use eyre::{Result, WrapErr};
use std::sync::Arc;
use stream_worker::{health_router, HealthState, StreamWorker, WorkerConfig};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

/// Run the executor worker.
pub async fn run() -> Result<()> {
    let environment = Environment::from_env();
    core_config::tracing::init_tracing(&environment);
    observability::init_metrics();

    let app_info = app_info!();
    info!(name = %app_info.name, version = %app_info.version, "Starting eval executor worker");

    let health_port: u16 = env_parsed("EXECUTOR_WORKER_HEALTH_PORT", "8083")
        .wrap_err("Invalid EXECUTOR_WORKER_HEALTH_PORT")?;
    let settings = EvalWorkerSettings::from_env().wrap_err("Failed to load worker settings")?;

    let pg_config = PostgresConfig::from_env().wrap_err("Failed to load PostgreSQL configuration")?;
    let db = database::postgres::connect_from_config_with_retry(pg_config, None)
        .await
        .wrap_err("Failed to connect to PostgreSQL")?;

    let redis_config = RedisConfig::from_env().wrap_err("Failed to load Redis configuration")?;
    let redis = database::redis::connect_from_config_with_retry(redis_config, None)
        .await
        .wrap_err("Failed to connect to Redis")?;

    let worker_config = WorkerConfig::from_stream_def::<EvalExecutionStream>()
        .with_blocking(Some(1_000))
        .with_batch_size(50)
        .with_max_concurrent_jobs(settings.executor_concurrency);
    info!(
        stream = %worker_config.stream_name,
        consumer_group = %worker_config.consumer_group,
        max_concurrent_jobs = %worker_config.max_concurrent_jobs,
        "Worker configuration loaded"
    );

    let repository = Arc::new(PgEvalRepository::new(db));
    let evaluator = NoopEvaluator::new(repository.clone());
    let processor = EvalExecutorProcessor::new(evaluator, repository);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        axum_helpers::shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let health_state = HealthState::new(
        redis.clone(),
        app_info.name,
        app_info.version,
        worker_config.stream_name.clone(),
    );
    tokio::spawn(async move {
        if let Err(e) = serve_health(health_state, health_port).await {
            error!(error = %e, "Health server failed");
        }
    });

    info!("Starting evaluation executor consumer");
    let worker = StreamWorker::<EvalExecutionJob, _>::new(redis, processor, worker_config);
    worker
        .run(shutdown_rx)
        .await
        .map_err(|e| eyre::eyre!("{}", e))?;

    info!("Eval executor worker stopped");
    Ok(())
}

async fn serve_health(state: HealthState, port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("Failed to bind health server to {}", addr))?;

    info!(port = %port, "Health server listening");

    axum::serve(listener, health_router(state))
        .await
        .wrap_err("Health server failed")?;

    Ok(())
}
