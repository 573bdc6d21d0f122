//! Bounded exponential backoff for inference calls

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

/// Retry schedule shared by the network providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            min_delay,
            max_delay,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_secs(config.backoff_min_secs),
            Duration::from_secs(config.backoff_max_secs),
        )
    }

    /// Retry immediately, for tests
    pub fn immediate(max_retries: u32) -> Self {
        Self::new(max_retries, Duration::ZERO, Duration::ZERO)
    }

    /// Delay before retrying after the given zero-based attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = Duration::from_secs(2u64.saturating_pow(attempt.min(32)));
        exp.clamp(self.min_delay, self.max_delay)
    }

    /// Total attempts including the first
    pub fn attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempts are used up
    pub async fn retry<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    if attempt < self.max_retries {
                        let delay = self.delay_for(attempt);
                        tracing::warn!(
                            "Request failed (attempt {}/{}), retrying in {:?}: {}",
                            attempt + 1,
                            self.attempts(),
                            delay,
                            e
                        );
                        sleep(delay).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::llm("Unknown error")))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&LlmConfig::default())
    }
}

/// Map a non-success HTTP status to the matching error kind
///
/// Client errors other than 429 cannot succeed on retry.
pub(crate) fn status_error(status: reqwest::StatusCode, body: &str) -> Error {
    let message = format!("HTTP {} - {}", status, body.trim());
    if status.is_client_error() && status != reqwest::StatusCode::TOO_MANY_REQUESTS {
        Error::LlmRejected(message)
    } else {
        Error::Llm(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delay_is_clamped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(4));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));
        assert_eq!(policy.delay_for(4), Duration::from_secs(10));
        assert_eq!(policy.delay_for(40), Duration::from_secs(10));
        assert_eq!(policy.attempts(), 3);
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = RetryPolicy::immediate(2)
            .retry(|| async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(Error::llm("rate limited"))
                } else {
                    Ok("svar")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "svar");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = RetryPolicy::immediate(2)
            .retry(|| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(Error::llm("down"))
            })
            .await;

        assert!(matches!(result, Err(Error::Llm(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_rejected_request_is_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = RetryPolicy::immediate(2)
            .retry(|| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(Error::LlmRejected("HTTP 401".into()))
            })
            .await;

        assert!(matches!(result, Err(Error::LlmRejected(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_status_error_kinds() {
        assert!(matches!(
            status_error(reqwest::StatusCode::UNAUTHORIZED, "bad key"),
            Error::LlmRejected(_)
        ));
        assert!(matches!(
            status_error(reqwest::StatusCode::TOO_MANY_REQUESTS, ""),
            Error::Llm(_)
        ));
        assert!(matches!(
            status_error(reqwest::StatusCode::BAD_GATEWAY, ""),
            Error::Llm(_)
        ));
    }
}
