//! Bounded retry with a fixed delay for transient infrastructure failures

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::error::FeedError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_millis(500),
        }
    }
}

/// Run `operation` until it succeeds, fails permanently, or attempts run out.
/// The last error is returned.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, FeedError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FeedError>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < attempts => {
                warn!(
                    operation = operation_name,
                    attempt,
                    attempts,
                    error = %e,
                    "Transient failure, retrying"
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy() -> RetryPolicy {
        RetryPolicy {
            attempts: 3,
            delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = retry_with_backoff(policy(), "test", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(FeedError::Rpc("connection reset".into()))
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = retry_with_backoff(policy(), "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(FeedError::Timeout { after_ms: 5 })
        })
        .await;

        assert_eq!(result, Err(FeedError::Timeout { after_ms: 5 }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = retry_with_backoff(policy(), "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(FeedError::Parse("bad abi".into()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
