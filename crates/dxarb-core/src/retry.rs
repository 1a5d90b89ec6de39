//! Bounded retry with linear backoff.
//!
//! Every outbound venue call goes through [`with_retry`]. Errors decide for
//! themselves whether they are worth another attempt via [`Transient`];
//! permanent failures (bad symbol, non-zero result code) return at once.

use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Classifies an error as retryable.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

/// Attempt budget and backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay after attempt `n` is `base_delay * n`.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const fn linear(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// A single attempt, no retry.
    pub const fn once() -> Self {
        Self::linear(1, Duration::ZERO)
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Failure after the retry wrapper gave up.
#[derive(Debug, Error)]
pub enum RetryError<E: fmt::Debug + fmt::Display> {
    /// Every attempt failed with a transient error.
    #[error("unavailable after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },

    /// A non-transient error stopped the loop early.
    #[error("{0}")]
    Permanent(E),
}

impl<E: fmt::Debug + fmt::Display> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            Self::Exhausted { last, .. } => last,
            Self::Permanent(e) => e,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

/// Run `op` until it succeeds, fails permanently, or the budget is spent.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    name: &str,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    E: Transient + fmt::Debug + fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = policy.attempts();
    let started = Instant::now();
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => {
                debug!(
                    op = name,
                    attempt,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Request completed"
                );
                return Ok(value);
            }
            Err(e) if !e.is_transient() => {
                debug!(op = name, attempt, error = %e, "Permanent failure, not retrying");
                return Err(RetryError::Permanent(e));
            }
            Err(e) if attempt >= attempts => {
                warn!(op = name, attempts, error = %e, "Retries exhausted");
                return Err(RetryError::Exhausted { attempts, last: e });
            }
            Err(e) => {
                let delay = policy.delay_for(attempt);
                warn!(
                    op = name,
                    attempt,
                    max_attempts = attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Request failed, retrying"
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
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    enum TestError {
        Flaky,
        Fatal,
    }

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::Flaky => write!(f, "flaky"),
                Self::Fatal => write!(f, "fatal"),
            }
        }
    }

    impl Transient for TestError {
        fn is_transient(&self) -> bool {
            matches!(self, Self::Flaky)
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::linear(3, Duration::from_millis(1))
    }

    #[test]
    fn test_linear_delay() {
        let policy = RetryPolicy::linear(3, Duration::from_secs(2));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_exhausted_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, _> = with_retry(&fast_policy(), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(TestError::Flaky)
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let err = result.unwrap_err();
        assert!(err.is_exhausted());
        assert_eq!(err.to_string(), "unavailable after 3 attempts: flaky");
        assert!(matches!(err.into_inner(), TestError::Flaky));
    }

    #[tokio::test]
    async fn test_recovers_on_second_attempt() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast_policy(), "test", || async {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(TestError::Flaky)
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&fast_policy(), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(TestError::Fatal)
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(RetryError::Permanent(TestError::Fatal))));
    }

    #[tokio::test]
    async fn test_zero_attempts_runs_once() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::linear(0, Duration::ZERO);
        let _: Result<(), _> = with_retry(&policy, "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(TestError::Flaky)
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
