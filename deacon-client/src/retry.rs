//! Bounded retry for remote operations.

use deacon_core::{DeaconResult, RetryConfig, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY_MS};
use std::future::Future;
use std::time::Duration;

/// Delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Same delay before every retry.
    Fixed(Duration),
    /// `initial * multiplier^n` before retry `n`, capped at `max`.
    Exponential {
        initial: Duration,
        multiplier: f64,
        max: Duration,
    },
}

impl Backoff {
    /// Delay before the retry with zero-based index `retry`.
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        match *self {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential {
                initial,
                multiplier,
                max,
            } => {
                let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
                let millis = initial.as_millis() as f64 * multiplier.powi(exponent);
                let capped = millis.min(max.as_millis() as f64);
                Duration::from_millis(capped as u64)
            }
        }
    }
}

/// How often and how patiently an operation is retried.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: Backoff::Fixed(Duration::from_millis(DEFAULT_RETRY_DELAY_MS)),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Backoff) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Fail on the first error.
    pub fn none() -> Self {
        Self::new(0, Backoff::Fixed(Duration::ZERO))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        let backoff = if config.backoff_multiplier <= 1.0 {
            Backoff::Fixed(config.initial_backoff())
        } else {
            Backoff::Exponential {
                initial: config.initial_backoff(),
                multiplier: config.backoff_multiplier,
                max: config.max_backoff(),
            }
        };
        Self::new(config.max_retries, backoff)
    }
}

/// Run `op` until it succeeds or the policy is exhausted.
///
/// Returns the last error when every attempt failed. `operation` names the
/// call in log events.
pub async fn retry_with_policy<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: F,
) -> DeaconResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = DeaconResult<T>>,
{
    let max_attempts = policy.max_attempts();
    let mut attempt: u32 = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= max_attempts => {
                tracing::error!(
                    operation = operation,
                    attempts = attempt,
                    error = %e,
                    "Operation failed after all retry attempts"
                );
                return Err(e);
            }
            Err(e) => {
                let delay = policy.backoff.delay_for_retry(attempt - 1);
                tracing::warn!(
                    operation = operation,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Operation failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deacon_core::{DeaconError, RemoteError};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn rate_limited() -> DeaconError {
        RemoteError::RequestFailed {
            path: "/post/parent1/connection".to_string(),
            status: 429,
            message: "Too many requests".to_string(),
        }
        .into()
    }

    /// Fails `failures` times, then succeeds with the attempt number.
    async fn flaky(calls: &AtomicU32, failures: u32) -> DeaconResult<u32> {
        let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= failures {
            Err(rate_limited())
        } else {
            Ok(call)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_failures_then_success() {
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result = retry_with_policy(&RetryPolicy::default(), "create_connection", || {
            flaky(&calls, 3)
        })
        .await;

        assert_eq!(result.unwrap(), 4);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(started.elapsed(), Duration::from_millis(900));
    }

    #[tokio::test(start_paused = true)]
    async fn test_four_failures_exhausts_policy() {
        let calls = AtomicU32::new(0);

        let result = retry_with_policy(&RetryPolicy::default(), "create_connection", || {
            flaky(&calls, 4)
        })
        .await;

        assert_eq!(result.unwrap_err(), rate_limited());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_no_retry_policy() {
        let calls = AtomicU32::new(0);
        let result = retry_with_policy(&RetryPolicy::none(), "op", || flaky(&calls, 1)).await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_exponential_backoff_is_capped() {
        let backoff = Backoff::Exponential {
            initial: Duration::from_millis(100),
            multiplier: 2.0,
            max: Duration::from_millis(500),
        };
        assert_eq!(backoff.delay_for_retry(0), Duration::from_millis(100));
        assert_eq!(backoff.delay_for_retry(2), Duration::from_millis(400));
        assert_eq!(backoff.delay_for_retry(3), Duration::from_millis(500));
        assert_eq!(backoff.delay_for_retry(u32::MAX), Duration::from_millis(500));
    }

    #[test]
    fn test_policy_from_config() {
        let policy = RetryPolicy::from(&RetryConfig::default());
        assert_eq!(policy, RetryPolicy::default());
        assert_eq!(policy.max_attempts(), 4);

        let config = RetryConfig {
            backoff_multiplier: 2.0,
            max_backoff_ms: 5_000,
            ..RetryConfig::default()
        };
        assert!(matches!(
            RetryPolicy::from(&config).backoff,
            Backoff::Exponential { .. }
        ));
    }
}
