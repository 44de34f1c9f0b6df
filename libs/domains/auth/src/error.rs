use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Unknown plan or malformed key metadata. A server-side data problem,
    /// never the client's fault.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The rate-limit store failed or timed out. Surfaced as 500 so a
    /// broken Redis never masquerades as limit exhaustion.
    #[error("Rate limit store error: {0}")]
    RateLimitStore(String),

    #[error("Database error: {0}")]
    Database(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthorized(msg) => AppError::Unauthorized(msg),
            AuthError::Forbidden(msg) => AppError::Forbidden(msg),
            AuthError::Config(msg) => AppError::Internal(format!("Configuration error: {}", msg)),
            AuthError::RateLimitStore(msg) => {
                AppError::Internal(format!("Rate limit store error: {}", msg))
            }
            AuthError::Database(msg) => AppError::Internal(format!("Database error: {}", msg)),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        AuthError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn unauthorized_maps_to_401() {
        let response = AuthError::Unauthorized("bad key".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn store_failures_map_to_500_not_429() {
        let response = AuthError::RateLimitStore("timeout".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
