//! Resilient delivery core
//!
//! Fault-tolerance around the remote ingestion call:
//! - **CircuitBreaker**: fail-fast while the backend is presumed down
//! - **RetryPolicy**: bounded exponential backoff for transient failures
//! - **FallbackStore**: durable local persistence for what never made it
//! - **DeliveryClient**: orchestrates the three around one ingest call

mod circuit_breaker;
mod client;
mod fallback;
mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use client::{Delivery, DeliveryClient, HealthState, HealthStatus};
pub use fallback::{FallbackStore, FALLBACK_FILE_PREFIX};
pub use retry::{BackoffConfig, RetryPolicy};
