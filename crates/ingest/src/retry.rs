//! Timeout and bounded exponential backoff for collaborator calls.

use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use ragline_core::config::IndexConfig;
use tracing::warn;

/// Errors that can tell a retryable failure from a permanent one.
pub trait Transient {
    fn is_transient(&self) -> bool;

    /// The error reported when a single attempt exceeds its timeout.
    fn timed_out(after: Duration) -> Self;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_factor: f64,
    pub max_jitter_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_delay_ms: 200,
            max_delay_ms: 2000,
            backoff_factor: 1.5,
            max_jitter_ms: 100,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &IndexConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.request_timeout_secs),
            max_retries: config.max_retries,
            ..Self::default()
        }
    }

    /// Backoff before retry number `retry` (1-based), without jitter.
    pub fn delay_ms(&self, retry: u32) -> u64 {
        let mut delay = self.initial_delay_ms;
        for _ in 1..retry {
            delay = ((delay as f64 * self.backoff_factor) as u64).min(self.max_delay_ms);
        }
        delay.min(self.max_delay_ms)
    }

    fn jitter_ms(&self) -> u64 {
        if self.max_jitter_ms == 0 {
            return 0;
        }
        // Jitter without rand: nanosecond fraction of the current time.
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .subsec_nanos() as u64;
        nanos % self.max_jitter_ms
    }
}

/// Run `call` until it succeeds, fails permanently, or exhausts the retries.
/// Each attempt is bounded by the policy timeout.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, operation: &str, mut call: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + Display,
{
    let mut retry = 0;
    loop {
        let result = match tokio::time::timeout(policy.timeout, call()).await {
            Ok(result) => result,
            Err(_) => Err(E::timed_out(policy.timeout)),
        };

        match result {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && retry < policy.max_retries => {
                retry += 1;
                let delay_ms = policy.delay_ms(retry) + policy.jitter_ms();
                warn!(
                    operation,
                    retry,
                    max_retries = policy.max_retries,
                    delay_ms,
                    error = %e,
                    "Transient failure, retrying"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[derive(Debug, PartialEq)]
    enum FakeError {
        Flaky,
        Fatal,
        Timeout,
    }

    impl Display for FakeError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{self:?}")
        }
    }

    impl Transient for FakeError {
        fn is_transient(&self) -> bool {
            !matches!(self, FakeError::Fatal)
        }

        fn timed_out(_after: Duration) -> Self {
            FakeError::Timeout
        }
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_millis(200),
            max_retries,
            initial_delay_ms: 1,
            max_delay_ms: 4,
            backoff_factor: 2.0,
            max_jitter_ms: 0,
        }
    }

    #[test]
    fn backoff_grows_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_ms(1), 200);
        assert_eq!(policy.delay_ms(2), 300);
        assert_eq!(policy.delay_ms(3), 450);
        assert_eq!(policy.delay_ms(20), 2000);
    }

    #[tokio::test]
    async fn retries_transient_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast_policy(3), "test", || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(FakeError::Flaky)
            } else {
                Ok("done")
            }
        })
        .await;
        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&fast_policy(2), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(FakeError::Flaky)
        })
        .await;
        assert_eq!(result, Err(FakeError::Flaky));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&fast_policy(5), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(FakeError::Fatal)
        })
        .await;
        assert_eq!(result, Err(FakeError::Fatal));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn slow_attempts_time_out() {
        let policy = RetryPolicy {
            timeout: Duration::from_millis(5),
            ..fast_policy(1)
        };
        let calls = AtomicU32::new(0);
        let result: Result<(), FakeError> = with_retry(&policy, "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert_eq!(result, Err(FakeError::Timeout));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
