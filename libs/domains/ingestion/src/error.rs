use thiserror::Error;

/// Per-event error taxonomy.
///
/// The per-item status in the 207 batch response and the retry predicate
/// both derive from the variant, so processors only pick the right kind.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("Invalid event: {0}")]
    BadRequest(String),

    #[error("Access denied: {0}")]
    Authentication(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type IngestionResult<T> = Result<T, IngestionError>;

impl IngestionError {
    /// Per-item HTTP status in the batch response.
    pub fn status(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::Authentication(_) => 401,
            Self::NotFound(_) => 404,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Client errors are final; infrastructure errors get retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Internal(_))
    }

    /// Machine-readable kind for the batch error slot.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BadRequest",
            Self::Authentication(_) => "Authentication",
            Self::NotFound(_) => "ResourceNotFound",
            Self::Database(_) => "DatabaseError",
            Self::Internal(_) => "InternalError",
        }
    }
}

impl From<sea_orm::DbErr> for IngestionError {
    fn from(err: sea_orm::DbErr) -> Self {
        IngestionError::Database(err.to_string())
    }
}

impl From<validator::ValidationErrors> for IngestionError {
    fn from(err: validator::ValidationErrors) -> Self {
        IngestionError::BadRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(IngestionError::BadRequest("x".into()).status(), 400);
        assert_eq!(IngestionError::Authentication("x".into()).status(), 401);
        assert_eq!(IngestionError::NotFound("x".into()).status(), 404);
        assert_eq!(IngestionError::Database("x".into()).status(), 500);
        assert_eq!(IngestionError::Internal("x".into()).status(), 500);
    }

    #[test]
    fn only_infrastructure_errors_retry() {
        assert!(IngestionError::Database("x".into()).is_retryable());
        assert!(IngestionError::Internal("x".into()).is_retryable());
        assert!(!IngestionError::BadRequest("x".into()).is_retryable());
        assert!(!IngestionError::Authentication("x".into()).is_retryable());
        assert!(!IngestionError::NotFound("x".into()).is_retryable());
    }
}
