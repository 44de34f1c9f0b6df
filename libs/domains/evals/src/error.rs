use stream_worker::StreamError;
use thiserror::Error;

/// Domain errors raised while creating or executing evaluation jobs.
#[derive(Debug, Error)]
pub enum EvalError {
    /// Upstream model/provider API failure, including missing provider
    /// credentials. Expected in normal operation.
    #[error("{0}")]
    Api(String),

    #[error("Invalid evaluation configuration: {0}")]
    Configuration(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type EvalResult<T> = Result<T, EvalError>;

impl EvalError {
    /// Message persisted onto the job execution row. Domain errors surface
    /// their own message; infrastructure errors stay opaque to users.
    pub fn display_message(&self) -> String {
        match self {
            Self::Api(msg) => msg.clone(),
            Self::Configuration(_) | Self::NotFound(_) => self.to_string(),
            Self::Database(_) | Self::Internal(_) => "An internal error occurred".to_string(),
        }
    }

    /// Expected errors skip exception reporting: provider API failures and
    /// missing provider keys happen routinely and would drown real alerts.
    pub fn is_expected(&self) -> bool {
        matches!(self, Self::Api(_)) || self.to_string().contains("API key for provider")
    }
}

impl From<sea_orm::DbErr> for EvalError {
    fn from(err: sea_orm::DbErr) -> Self {
        EvalError::Database(err.to_string())
    }
}

impl From<EvalError> for StreamError {
    fn from(err: EvalError) -> Self {
        match err {
            // Missing referenced state will not appear by retrying.
            EvalError::NotFound(msg) | EvalError::Configuration(msg) => {
                StreamError::Permanent(msg)
            }
            other => StreamError::Processing(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_surface_their_message() {
        let err = EvalError::Api("No API key for provider openai configured".to_string());
        assert_eq!(
            err.display_message(),
            "No API key for provider openai configured"
        );

        let err = EvalError::NotFound("Job execution abc not found".to_string());
        assert_eq!(err.display_message(), "Job execution abc not found");
    }

    #[test]
    fn infrastructure_errors_stay_opaque() {
        let err = EvalError::Database("connection refused at 10.0.0.3".to_string());
        assert_eq!(err.display_message(), "An internal error occurred");

        let err = EvalError::Internal("tokio task panicked".to_string());
        assert_eq!(err.display_message(), "An internal error occurred");
    }

    #[test]
    fn api_errors_are_expected() {
        assert!(EvalError::Api("rate limited by provider".to_string()).is_expected());
    }

    #[test]
    fn provider_key_messages_are_expected_regardless_of_kind() {
        let err =
            EvalError::Configuration("API key for provider anthropic missing".to_string());
        assert!(err.is_expected());
    }

    #[test]
    fn other_errors_are_reported() {
        assert!(!EvalError::Database("down".to_string()).is_expected());
        assert!(!EvalError::NotFound("gone".to_string()).is_expected());
    }

    #[test]
    fn stream_conversion_preserves_retryability() {
        let err: StreamError = EvalError::Database("down".to_string()).into();
        assert!(err.category().should_retry());

        let err: StreamError = EvalError::NotFound("gone".to_string()).into();
        assert!(!err.category().should_retry());
    }
}
