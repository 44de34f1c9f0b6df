//! Bounded per-event retry.

#[cfg(test)]
use crate::error::IngestionError;
use crate::error::IngestionResult;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Attempts per event, including the first.
pub const MAX_ATTEMPTS: u32 = 3;

const BASE_DELAY_MS: u64 = 100;

/// Run `operation` up to [`MAX_ATTEMPTS`] times with exponential backoff.
///
/// Only infrastructure errors re-run; client errors (bad request, auth,
/// not-found) return on the first attempt.
pub async fn retry_event<T, F, Fut>(mut operation: F) -> IngestionResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = IngestionResult<T>>,
{
    let mut attempt: u32 = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < MAX_ATTEMPTS => {
                let delay = backoff_delay(attempt);
                debug!(
                    attempt = attempt,
                    delay_ms = %delay.as_millis(),
                    error = %e,
                    "Retrying event"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Exponential backoff with jitter: 100ms, 200ms doubling, jittered to
/// 50-100% of the nominal value.
fn backoff_delay(attempt: u32) -> Duration {
    use std::collections::hash_map::RandomState;
    use std::hash::BuildHasher;

    let nominal = BASE_DELAY_MS.saturating_mul(2u64.saturating_pow(attempt - 1));
    let factor =
        (RandomState::new().hash_one(std::time::SystemTime::now()) % 50) as f64 / 100.0 + 0.5;

    Duration::from_millis((nominal as f64 * factor) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    async fn count_attempts(results: Vec<IngestionResult<()>>) -> (IngestionResult<()>, u32) {
        let attempts = Arc::new(AtomicU32::new(0));
        let mut queue = results.into_iter();
        let counter = attempts.clone();

        let result = retry_event(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            let next = queue.next().expect("ran out of scripted results");
            async move { next }
        })
        .await;

        (result, attempts.load(Ordering::SeqCst))
    }

    #[tokio::test]
    async fn success_returns_immediately() {
        let (result, attempts) = count_attempts(vec![Ok(())]).await;
        assert!(result.is_ok());
        assert_eq!(attempts, 1);
    }

    #[tokio::test]
    async fn retryable_error_runs_three_times() {
        let (result, attempts) = count_attempts(vec![
            Err(IngestionError::Database("down".into())),
            Err(IngestionError::Database("down".into())),
            Err(IngestionError::Database("down".into())),
        ])
        .await;

        assert!(result.is_err());
        assert_eq!(attempts, MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let (result, attempts) = count_attempts(vec![
            Err(IngestionError::Database("down".into())),
            Ok(()),
        ])
        .await;

        assert!(result.is_ok());
        assert_eq!(attempts, 2);
    }

    #[tokio::test]
    async fn authentication_error_is_never_retried() {
        let (result, attempts) =
            count_attempts(vec![Err(IngestionError::Authentication("denied".into()))]).await;

        assert!(matches!(result, Err(IngestionError::Authentication(_))));
        assert_eq!(attempts, 1);
    }

    #[tokio::test]
    async fn bad_request_is_never_retried() {
        let (result, attempts) =
            count_attempts(vec![Err(IngestionError::BadRequest("nope".into()))]).await;

        assert!(result.is_err());
        assert_eq!(attempts, 1);
    }
}
