//! Server bootstrap: listener setup, graceful shutdown, health endpoints.

mod app;
mod health;
mod shutdown;

pub use app::{create_app, create_app_with_cleanup};
pub use health::{health_router, HealthResponse};
pub use shutdown::shutdown_signal;
