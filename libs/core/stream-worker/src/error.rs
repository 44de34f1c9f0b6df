//! Error types and retry categorization for stream operations.

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by stream operations and job processors.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failure inside a processor that may succeed on a later attempt.
    #[error("Processing error: {0}")]
    Processing(String),

    /// Failure that no amount of retrying will fix (bad payload, missing
    /// referenced entity). Goes straight to the DLQ.
    #[error("Permanent processing error: {0}")]
    Permanent(String),

    /// Downstream pushed back; retried with a longer backoff.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Consumer group error: {0}")]
    ConsumerGroup(String),

    #[error("Job parsing error: {0}")]
    JobParsing(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl StreamError {
    /// `XREADGROUP BLOCK` returning empty is reported as a timeout by some
    /// connection layers; it is normal idle behavior, not a failure.
    pub fn is_block_timeout(&self) -> bool {
        match self {
            Self::Redis(e) => {
                let msg = e.to_string().to_lowercase();
                msg.contains("timed out") && !msg.contains("connection")
            }
            _ => false,
        }
    }

    /// Consumer group missing (NOGROUP); recreated by the worker loop.
    pub fn is_nogroup_error(&self) -> bool {
        match self {
            Self::Redis(e) => e.to_string().contains("NOGROUP"),
            Self::ConsumerGroup(s) => s.contains("NOGROUP"),
            _ => false,
        }
    }

    pub fn is_connection_error(&self) -> bool {
        match self {
            Self::Redis(e) => {
                if self.is_block_timeout() {
                    return false;
                }
                let msg = e.to_string().to_lowercase();
                msg.contains("connection")
                    || msg.contains("broken pipe")
                    || msg.contains("reset by peer")
                    || msg.contains("refused")
                    || msg.contains("io error")
            }
            _ => false,
        }
    }

    /// Categorize for retry handling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Redis(_) | Self::Processing(_) | Self::ConsumerGroup(_) => {
                ErrorCategory::Transient
            }
            Self::RateLimited(_) => ErrorCategory::RateLimited,
            Self::Permanent(_) | Self::Serialization(_) | Self::JobParsing(_) | Self::Config(_) => {
                ErrorCategory::Permanent
            }
        }
    }
}

/// Retry behavior classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Retry with exponential backoff.
    Transient,
    /// No retry; dead-letter immediately.
    Permanent,
    /// Retry with a longer backoff window.
    RateLimited,
}

impl ErrorCategory {
    pub fn should_retry(&self) -> bool {
        !matches!(self, Self::Permanent)
    }

    /// Nominal backoff for retry `attempt` (0-based), with jitter.
    /// Advisory: deliveries are settled immediately, so this informs
    /// logging rather than holding a message un-acked.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        let base_ms: u64 = match self {
            Self::Transient => 500,
            Self::RateLimited => 5_000,
            Self::Permanent => return None,
        };

        let max_ms: u64 = match self {
            Self::Transient => 30_000,
            Self::RateLimited => 120_000,
            Self::Permanent => unreachable!(),
        };

        let exp = base_ms.saturating_mul(2u64.saturating_pow(attempt)).min(max_ms);
        Some(Duration::from_millis(apply_jitter(exp)))
    }
}

/// Spread a delay to 75-125% of its value to avoid retry synchronization.
fn apply_jitter(delay_ms: u64) -> u64 {
    use std::collections::hash_map::RandomState;
    use std::hash::BuildHasher;

    let jitter_range = delay_ms / 4;
    if jitter_range == 0 {
        return delay_ms;
    }

    let offset = (RandomState::new().hash_one(std::time::SystemTime::now())
        % (jitter_range * 2 + 1)) as i64
        - jitter_range as i64;

    if offset < 0 {
        delay_ms.saturating_sub(offset.unsigned_abs())
    } else {
        delay_ms.saturating_add(offset as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_retry() {
        let err = StreamError::Processing("database unavailable".to_string());
        assert_eq!(err.category(), ErrorCategory::Transient);
        assert!(err.category().should_retry());
    }

    #[test]
    fn permanent_errors_do_not_retry() {
        for err in [
            StreamError::Permanent("trace does not exist".to_string()),
            StreamError::JobParsing("missing job field".to_string()),
            StreamError::Config("unknown stream".to_string()),
        ] {
            assert_eq!(err.category(), ErrorCategory::Permanent);
            assert!(!err.category().should_retry());
            assert_eq!(err.category().delay_for_attempt(0), None);
        }
    }

    #[test]
    fn rate_limited_backs_off_longer() {
        let transient = ErrorCategory::Transient.delay_for_attempt(0).unwrap();
        let limited = ErrorCategory::RateLimited.delay_for_attempt(0).unwrap();
        assert!(limited > transient);
    }

    #[test]
    fn delay_grows_and_caps() {
        let early = ErrorCategory::Transient.delay_for_attempt(0).unwrap();
        // Jitter is +-25%, so even the jittered cap stays below 40s.
        let late = ErrorCategory::Transient.delay_for_attempt(20).unwrap();
        assert!(early.as_millis() < 1000);
        assert!(late.as_millis() <= 40_000);
    }

    #[test]
    fn nogroup_detection() {
        let err = StreamError::ConsumerGroup("NOGROUP No such consumer group".to_string());
        assert!(err.is_nogroup_error());
    }

    #[test]
    fn jitter_stays_in_band() {
        for _ in 0..50 {
            let jittered = apply_jitter(1000);
            assert!((750..=1250).contains(&jittered));
        }
    }
}
