use super::shutdown::shutdown_signal;
use axum::Router;
use core_config::server::ServerConfig;
use std::io;
use std::time::Duration;
use tracing::info;

/// Start the axum server with graceful shutdown on SIGINT/SIGTERM.
pub async fn create_app(router: Router, server_config: &ServerConfig) -> io::Result<()> {
    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;

    info!("Server listening on {}", listener.local_addr()?);
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .inspect_err(|e| {
            tracing::error!("Server error: {:?}", e);
        })?;

    Ok(())
}

/// Start the axum server and run a cleanup future after shutdown begins.
///
/// The cleanup future (closing database pools, draining connections) is
/// bounded by `cleanup_timeout` so a stuck teardown cannot block process
/// exit indefinitely.
pub async fn create_app_with_cleanup<F>(
    router: Router,
    server_config: &ServerConfig,
    cleanup_timeout: Duration,
    cleanup: F,
) -> io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;
    info!("Server listening on {}", listener.local_addr()?);

    let serve_result = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .inspect_err(|e| {
            tracing::error!("Server error: {:?}", e);
        });

    info!("Running cleanup (timeout: {:?})", cleanup_timeout);
    match tokio::time::timeout(cleanup_timeout, cleanup).await {
        Ok(_) => info!("Cleanup completed"),
        Err(_) => tracing::warn!("Cleanup exceeded {:?}, exiting anyway", cleanup_timeout),
    }

    serve_result
}
