//! Circuit breaker for backend protection
//!
//! Counts consecutive failures and short-circuits deliveries while the
//! backend is presumed down. Reopening is optimistic: once the cooldown
//! elapses the next `allow()` closes the circuit outright, there is no
//! half-open probe state - the next real delivery is the probe.
//!
//! # State Transitions
//! ```text
//! Closed → Open:   failures >= threshold
//! Open   → Closed: cooldown elapsed since last failure, reset on allow()
//! ```

use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Circuit state, for logging and health reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
        }
    }
}

/// Configuration for the circuit breaker
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    pub failure_threshold: u32,
    /// How long the open circuit rejects deliveries
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Default)]
struct BreakerState {
    failures: u32,
    last_failure: Option<Instant>,
}

/// Consecutive-failure circuit breaker
///
/// Interior mutability so `&self` methods compose with the async delivery
/// path; the mutex covers single-owner mutation, nothing more.
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: Mutex::new(BreakerState::default()),
        }
    }

    /// Create with default config
    pub fn with_defaults() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }

    /// Whether a delivery may be attempted now
    ///
    /// Returns false only while the circuit is open and inside the
    /// cooldown window. Once the cooldown has elapsed the failure count
    /// resets and the call is allowed unconditionally.
    pub fn allow(&self) -> bool {
        let mut state = self.state.lock();

        if state.failures >= self.config.failure_threshold {
            if let Some(last_failure) = state.last_failure {
                if last_failure.elapsed() < self.config.cooldown {
                    warn!(
                        failures = state.failures,
                        cooldown_secs = self.config.cooldown.as_secs(),
                        "circuit open, rejecting delivery"
                    );
                    return false;
                }
            }
            debug!(failures = state.failures, "cooldown elapsed, closing circuit");
            state.failures = 0;
        }

        true
    }

    /// Record a failed delivery attempt
    pub fn record_failure(&self) {
        let mut state = self.state.lock();
        state.failures += 1;
        state.last_failure = Some(Instant::now());
    }

    /// Record a successful delivery
    pub fn record_success(&self) {
        self.state.lock().failures = 0;
    }

    /// Current consecutive-failure count
    pub fn failures(&self) -> u32 {
        self.state.lock().failures
    }

    /// Current state without mutating it
    pub fn state(&self) -> CircuitState {
        let state = self.state.lock();
        let within_cooldown = state
            .last_failure
            .map(|at| at.elapsed() < self.config.cooldown)
            .unwrap_or(false);

        if state.failures >= self.config.failure_threshold && within_cooldown {
            CircuitState::Open
        } else {
            CircuitState::Closed
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn breaker(threshold: u32, cooldown: Duration) -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: threshold,
            cooldown,
        })
    }

    #[test]
    fn test_allows_while_under_threshold() {
        let cb = breaker(3, Duration::from_secs(60));
        cb.record_failure();
        cb.record_failure();
        assert!(cb.allow());
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_opens_at_threshold() {
        let cb = breaker(3, Duration::from_secs(60));
        for _ in 0..3 {
            cb.record_failure();
        }
        assert!(!cb.allow());
        assert_eq!(cb.state(), CircuitState::Open);
        assert_eq!(cb.failures(), 3);
    }

    #[test]
    fn test_success_resets_failures() {
        let cb = breaker(3, Duration::from_secs(60));
        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        assert_eq!(cb.failures(), 0);

        // Threshold counts consecutive failures only
        cb.record_failure();
        cb.record_failure();
        assert!(cb.allow());
    }

    #[test]
    fn test_cooldown_elapse_closes_without_success() {
        let cb = breaker(2, Duration::from_millis(20));
        cb.record_failure();
        cb.record_failure();
        assert!(!cb.allow());

        std::thread::sleep(Duration::from_millis(30));

        // No intervening success: the elapsed cooldown alone closes the
        // circuit and resets the count
        assert!(cb.allow());
        assert_eq!(cb.failures(), 0);
        assert!(cb.allow());
    }

    #[test]
    fn test_open_again_after_renewed_failures() {
        let cb = breaker(2, Duration::from_millis(20));
        cb.record_failure();
        cb.record_failure();
        std::thread::sleep(Duration::from_millis(30));
        assert!(cb.allow());

        cb.record_failure();
        cb.record_failure();
        assert!(!cb.allow());
    }

    #[test]
    fn test_state_inspection_does_not_reset() {
        let cb = breaker(1, Duration::from_millis(20));
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);

        std::thread::sleep(Duration::from_millis(30));

        // state() reports Closed after the cooldown but leaves the reset
        // to allow()
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.failures(), 1);
        assert!(cb.allow());
        assert_eq!(cb.failures(), 0);
    }
}
