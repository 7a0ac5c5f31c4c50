//! VASTE - Resilient Response-Time Telemetry
//!
//! Records response-time measurements for a multi-channel chatbot (chat,
//! voz, email), forwards them to a remote telemetry backend, and guards
//! against backend unavailability with a circuit breaker, bounded
//! exponential-backoff retry, and durable local fallback files.
//!
//! # Architecture
//!
//! ```text
//! record(channel, duration)
//!         │
//!         ▼
//! ResponseTimeRecorder ──► DeliveryClient ──► Ingestor (remote backend)
//!   channel buffers          circuit breaker      │
//!   SLA alerts               retry w/ backoff     ▼
//!   local backup file        fallback store   response_times_fallback_*.json
//! ```
//!
//! The ingestion backend is pluggable via the [`Ingestor`] trait.

#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]

pub mod config;
pub mod deliver;
pub mod error;
pub mod ingest;
pub mod record;
pub mod recorder;

pub use config::MonitorConfig;
pub use deliver::{
    BackoffConfig, CircuitBreaker, CircuitBreakerConfig, CircuitState, Delivery, DeliveryClient,
    FallbackStore, HealthState, HealthStatus, RetryPolicy,
};
pub use error::{DeliveryError, IngestError, MonitorError, Result, Severity};
pub use ingest::{AxiomIngestor, Ingestor, StdoutIngestor};
pub use record::{
    ChannelStats, FallbackReason, TelemetryRecord, SLA_THRESHOLD, VERSION,
};
pub use recorder::ResponseTimeRecorder;
