//! Shared application state.

use crate::config::Config;
use database::postgres::DatabaseConnection;
use database::redis::ConnectionManager;

/// Cloned per handler; both connections are cheap handle clones.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: DatabaseConnection,
    pub redis: ConnectionManager,
}
