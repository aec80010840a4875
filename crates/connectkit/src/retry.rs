//! Retry logic with exponential backoff for transient authentication errors.

use crate::error::{Error, Result};
use crate::types::RetryConfig;
use std::future::Future;
use std::time::Duration;

/// Callback trait for retry progress notifications.
pub trait RetryCallback: Send + Sync {
    /// Called when an operation is being retried.
    ///
    /// # Arguments
    /// * `attempt` - Attempt that just failed (1-indexed)
    /// * `max_attempts` - Maximum number of attempts
    /// * `error` - The error that triggered the retry
    /// * `delay` - Time until next attempt
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &Error, delay: Duration);
}

/// No-op callback that does nothing.
pub struct NoCallback;

impl RetryCallback for NoCallback {
    fn on_retry(&self, _attempt: u32, _max_attempts: u32, _error: &Error, _delay: Duration) {}
}

/// Callback that reports retries through the `log` facade.
pub struct LogCallback;

impl RetryCallback for LogCallback {
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &Error, delay: Duration) {
        log::warn!(
            "Attempt {attempt}/{max_attempts} failed: {error}. Retrying in {}ms...",
            delay.as_millis()
        );
    }
}

/// Execute an async operation with retry logic.
///
/// Retries the operation while it returns a retryable error, sleeping with
/// exponential backoff between attempts. Non-retryable errors are returned
/// on the first occurrence.
///
/// # Returns
/// The result of the operation, or the last error if all attempts failed.
pub async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    callback: Option<&dyn RetryCallback>,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        let error = match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        if !error.is_retryable() || attempt + 1 >= max_attempts {
            return Err(error);
        }

        let delay = config.delay_for_attempt(attempt);
        if let Some(cb) = callback {
            cb.on_retry(attempt + 1, max_attempts, &error, delay);
        }

        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tonic::Code;

    fn unauthenticated() -> Error {
        Error::status(Code::Unauthenticated, "token not yet valid")
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_retry_success_first_try() {
        let result = with_retry(&RetryConfig::default(), None, || async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_is_not_retried() {
        let attempts = AtomicU32::new(0);

        let result: Result<()> = with_retry(&RetryConfig::default(), None, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::status(Code::NotFound, "missing")) }
        })
        .await;

        assert!(result.unwrap_err().is_not_found());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_argument_is_not_retried() {
        let attempts = AtomicU32::new(0);

        let result: Result<()> = with_retry(&RetryConfig::default(), None, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::status(Code::InvalidArgument, "bad")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthenticated_eventual_success() {
        let attempts = AtomicU32::new(0);

        let result = with_retry(&RetryConfig::default(), None, || {
            let current = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if current < 2 {
                    Err(unauthenticated())
                } else {
                    Ok("ok")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthenticated_gives_up_after_ten_attempts() {
        let attempts = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result: Result<()> = with_retry(&RetryConfig::default(), None, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(unauthenticated()) }
        })
        .await;

        assert_eq!(result.unwrap_err().category(), crate::ErrorCategory::Unauthenticated);
        assert_eq!(attempts.load(Ordering::SeqCst), 10);
        // 100 + 200 + 400 + 800 + 5 * 1000 ms of backoff
        assert_eq!(started.elapsed(), Duration::from_millis(6500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_callback_invoked_with_backoff() {
        struct Recording(Arc<Mutex<Vec<Duration>>>);
        impl RetryCallback for Recording {
            fn on_retry(&self, _: u32, _: u32, _: &Error, delay: Duration) {
                self.0.lock().unwrap().push(delay);
            }
        }

        let delays = Arc::new(Mutex::new(Vec::new()));
        let callback = Recording(delays.clone());
        let config = RetryConfig::new(4, Duration::from_millis(100), 2.0);

        let _: Result<()> =
            with_retry(&config, Some(&callback), || async { Err(unauthenticated()) }).await;

        // Called between attempts only, never after the last one
        assert_eq!(
            *delays.lock().unwrap(),
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
            ]
        );
    }
}
