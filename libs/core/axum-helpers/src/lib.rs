//! Shared axum building blocks for the pipeline HTTP services.
//!
//! Provides the standard error response shape, server bootstrap with
//! graceful shutdown, health endpoints, and the CORS layer used by the
//! SDK-facing ingestion surface.

pub mod errors;
pub mod middleware;
pub mod server;

pub use errors::{AppError, ErrorResponse};
pub use server::{create_app, create_app_with_cleanup, health_router, shutdown_signal};
