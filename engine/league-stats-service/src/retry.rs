//! Single fixed-delay retry for rate-limited upstream calls

use mfl_fetcher::UpstreamError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Run an upstream call, retrying once after `backoff` if it was rate limited.
///
/// Any other error, or a second rate limit, is returned as-is.
pub async fn retry_once_on_rate_limit<F, Fut, T>(
    backoff: Duration,
    label: &str,
    mut f: F,
) -> Result<T, UpstreamError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    match f().await {
        Err(e) if e.is_rate_limited() => {
            warn!("{} rate limited: {}, retrying once in {:?}", label, e, backoff);
            sleep(backoff).await;
            f().await
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_retries_rate_limit_once_after_backoff() {
        let calls = AtomicUsize::new(0);
        let started = tokio::time::Instant::now();

        let result = retry_once_on_rate_limit(Duration::from_millis(2000), "test", || async {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(UpstreamError::rate_limited("slow down"))
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_rate_limit_is_returned() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = retry_once_on_rate_limit(Duration::from_millis(10), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(UpstreamError::rate_limited("still throttled"))
        })
        .await;

        assert!(result.is_err_and(|e| e.is_rate_limited()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = retry_once_on_rate_limit(Duration::from_secs(60), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(UpstreamError::unavailable("connection refused"))
        })
        .await;

        assert!(matches!(result, Err(UpstreamError::Unavailable { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
