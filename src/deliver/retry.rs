//! Bounded retry with exponential backoff
//!
//! Drives a fallible async operation up to a fixed number of attempts,
//! sleeping `initial_delay * multiplier^i` between attempts and nothing
//! after the last one. Sleeps go through `tokio::time`, so tests run the
//! backoff schedule under paused time instead of waiting for real clocks.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Configuration for retry backoff
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Total attempts per operation, including the first (minimum 1)
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound on a single delay
    pub max_delay: Duration,
    /// Delay growth factor per attempt
    pub multiplier: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
        }
    }
}

/// Bounded exponential-backoff retry policy
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: BackoffConfig,
}

impl RetryPolicy {
    /// Create a new retry policy
    pub fn new(config: BackoffConfig) -> Self {
        Self { config }
    }

    /// Create with default config
    pub fn with_defaults() -> Self {
        Self::new(BackoffConfig::default())
    }

    /// Total attempts this policy makes before giving up
    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts.max(1)
    }

    /// Run `operation` until it succeeds or attempts are exhausted
    ///
    /// `on_failure` is invoked once per failed attempt, before any sleep,
    /// so the caller can count failures as they happen rather than once
    /// at the end. On exhaustion the last error is returned unchanged.
    pub async fn run<T, E, F, Fut>(
        &self,
        operation_name: &str,
        mut on_failure: impl FnMut(&E),
        mut operation: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let max_attempts = self.max_attempts();
        let mut delay = self.config.initial_delay;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        info!(
                            operation = operation_name,
                            attempt,
                            "operation succeeded after retries"
                        );
                    }
                    return Ok(value);
                }
                Err(err) => {
                    on_failure(&err);

                    if attempt >= max_attempts {
                        warn!(
                            operation = operation_name,
                            attempts = attempt,
                            error = %err,
                            "all attempts exhausted"
                        );
                        return Err(err);
                    }

                    warn!(
                        operation = operation_name,
                        attempt,
                        max_attempts,
                        error = %err,
                        delay_ms = delay.as_millis() as u64,
                        "attempt failed, retrying"
                    );
                    sleep(delay).await;
                    delay = delay.mul_f64(self.config.multiplier).min(self.config.max_delay);
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn fast_config(max_attempts: u32) -> BackoffConfig {
        BackoffConfig {
            max_attempts,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn test_success_on_first_attempt_never_sleeps() {
        let policy = RetryPolicy::new(fast_config(3));
        let result: Result<i32, String> = policy
            .run("op", |_| {}, || async { Ok(42) })
            .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_invokes_operation_exactly_max_attempts_times() {
        let policy = RetryPolicy::new(fast_config(3));
        let calls = AtomicU32::new(0);

        let result: Result<(), String> = policy
            .run("op", |_| {}, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("down".to_string())
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_delays_double_and_stop_after_final_attempt() {
        let policy = RetryPolicy::new(fast_config(3));
        let start = Instant::now();

        let result: Result<(), String> = policy
            .run("op", |_| {}, || async { Err("down".to_string()) })
            .await;
        assert!(result.is_err());

        // 1s after attempt 1 + 2s after attempt 2, nothing after attempt 3
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_when_a_later_attempt_succeeds() {
        let policy = RetryPolicy::new(fast_config(3));
        let calls = AtomicU32::new(0);

        let result: Result<i32, String> = policy
            .run("op", |_| {}, || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err("transient".to_string())
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_failure_fires_once_per_failed_attempt() {
        let policy = RetryPolicy::new(fast_config(3));
        let failures = AtomicU32::new(0);

        let _: Result<(), String> = policy
            .run(
                "op",
                |_| {
                    failures.fetch_add(1, Ordering::SeqCst);
                },
                || async { Err("down".to_string()) },
            )
            .await;

        assert_eq!(failures.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_is_capped_at_max_delay() {
        let policy = RetryPolicy::new(BackoffConfig {
            max_attempts: 4,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(2),
            multiplier: 2.0,
        });
        let start = Instant::now();

        let _: Result<(), String> = policy
            .run("op", |_| {}, || async { Err("down".to_string()) })
            .await;

        // 1s + 2s + 2s (capped), nothing after the final attempt
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_zero_attempts_still_runs_once() {
        let policy = RetryPolicy::new(fast_config(0));
        let calls = AtomicU32::new(0);

        let _: Result<(), String> = policy
            .run("op", |_| {}, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("down".to_string())
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
