//! Fixed-delay retry logic for transient fetch failures
//!
//! Every request against the remote tracker goes through
//! [`fetch_with_retry`]: a failed attempt is consumed locally, the caller
//! sleeps the configured flat delay, and the operation is tried again until
//! the attempt budget runs out. The delay is constant — no exponential
//! backoff and no jitter; see [`RetryConfig`](crate::config::RetryConfig).

use crate::config::RetryConfig;
use crate::error::Error;
use std::future::Future;

/// Trait for errors that can be classified as retryable or not
///
/// Anything network-shaped (transport failure, non-2xx status, unparseable
/// body) is transient from the crawler's point of view. Configuration and
/// local I/O problems are permanent and surface immediately.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Network(_) | Error::FetchFailed { .. } => true,
            // Body-parse failures count as a failed attempt too
            Error::Serialization(_) => true,
            Error::Config { .. }
            | Error::PageRetriesExhausted { .. }
            | Error::Io(_)
            | Error::InvalidUrl(_) => false,
        }
    }
}

/// Execute an async operation with fixed-delay retries
///
/// Runs `operation` up to `config.max_attempts` times, sleeping
/// `config.delay` between attempts. Returns the first success, or the last
/// error once the budget is exhausted or a non-retryable error appears.
pub async fn fetch_with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut attempt: u32 = 1;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "request succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < config.max_attempts => {
                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = config.delay.as_millis(),
                    "request failed, retrying"
                );
                attempt += 1;
                tokio::time::sleep(config.delay).await;
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::error!(
                        error = %e,
                        attempts = attempt,
                        "request failed after all retry attempts exhausted"
                    );
                } else {
                    tracing::error!(error = %e, "request failed with non-retryable error");
                }
                return Err(e);
            }
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[derive(Debug)]
    enum TestError {
        Transient,
        Permanent,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                TestError::Transient => write!(f, "transient error"),
                TestError::Permanent => write!(f, "permanent error"),
            }
        }
    }

    impl IsRetryable for TestError {
        fn is_retryable(&self) -> bool {
            matches!(self, TestError::Transient)
        }
    }

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            delay: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn success_needs_one_call() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = fetch_with_retry(&fast_config(5), || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, TestError>(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 1, "should only call once");
    }

    #[tokio::test]
    async fn transient_failures_are_retried_until_success() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = fetch_with_retry(&fast_config(5), || {
            let counter = counter_clone.clone();
            async move {
                let count = counter.fetch_add(1, Ordering::SeqCst);
                if count < 2 {
                    Err(TestError::Transient)
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn budget_bounds_total_attempts() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = fetch_with_retry(&fast_config(5), || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(TestError::Transient)
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(
            counter.load(Ordering::SeqCst),
            5,
            "budget counts the first try plus four retries"
        );
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = fetch_with_retry(&fast_config(5), || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(TestError::Permanent)
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn delay_is_flat_between_attempts() {
        let config = RetryConfig {
            max_attempts: 3,
            delay: Duration::from_millis(20),
        };
        let start = std::time::Instant::now();

        let _result = fetch_with_retry(&config, || async {
            Err::<i32, _>(TestError::Transient)
        })
        .await;

        let elapsed = start.elapsed();
        // Two sleeps of 20ms each; generous upper bound for CI overhead
        assert!(elapsed >= Duration::from_millis(40), "waited {elapsed:?}");
        assert!(elapsed < Duration::from_secs(2), "waited {elapsed:?}");
    }
}
