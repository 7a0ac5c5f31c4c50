//! Delivery client - the resilient path to the backend
//!
//! Orchestrates circuit breaker, retry policy and fallback store around
//! one `Ingestor::ingest` call per record:
//!
//! ```text
//! deliver(record)
//!     → breaker.allow()?        no → fallback file, CircuitOpen
//!     → stamp _metadata
//!     → retry { ingest([record]) }   each failure feeds the breaker
//!     → success: breaker reset, latency reported
//!     → exhausted: fallback file, RetriesExhausted (CRITICAL)
//! ```

use crate::config::MonitorConfig;
use crate::deliver::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use crate::deliver::fallback::FallbackStore;
use crate::deliver::retry::{BackoffConfig, RetryPolicy};
use crate::error::DeliveryError;
use crate::ingest::Ingestor;
use crate::record::{
    FallbackReason, RecordMetadata, TelemetryRecord, API_VERSION, PROTOCOL_VERSION, VERSION,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Successful delivery outcome
#[derive(Debug, Clone, Copy)]
pub struct Delivery {
    /// Wall-clock time from send start to backend acknowledgement
    pub latency: Duration,
}

/// Integration health, as reported by [`DeliveryClient::health_check`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Health check report
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: HealthState,
    /// Round-trip latency of the probe in seconds, when it succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency: Option<f64>,
    /// Probe failure, when it did not
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub circuit_breaker_failures: u32,
    pub version: String,
    pub api_version: String,
    pub protocol: String,
}

/// Delivers one record at a time to an ingestion backend, falling back to
/// durable local persistence when the backend is unavailable
pub struct DeliveryClient {
    ingestor: Arc<dyn Ingestor>,
    breaker: CircuitBreaker,
    retry: RetryPolicy,
    fallback: FallbackStore,
}

impl DeliveryClient {
    /// Build a client from the monitor configuration
    pub fn new(ingestor: Arc<dyn Ingestor>, config: &MonitorConfig) -> Self {
        Self::with_parts(
            ingestor,
            CircuitBreaker::new(CircuitBreakerConfig {
                failure_threshold: config.failure_threshold,
                cooldown: config.cooldown,
            }),
            RetryPolicy::new(BackoffConfig {
                max_attempts: config.max_attempts,
                initial_delay: config.initial_delay,
                max_delay: config.max_delay,
                ..Default::default()
            }),
            FallbackStore::new(config.fallback_dir.clone(), config.retention_days),
        )
    }

    /// Build a client from explicitly constructed parts
    pub fn with_parts(
        ingestor: Arc<dyn Ingestor>,
        breaker: CircuitBreaker,
        retry: RetryPolicy,
        fallback: FallbackStore,
    ) -> Self {
        Self {
            ingestor,
            breaker,
            retry,
            fallback,
        }
    }

    /// Deliver one record to the backend
    ///
    /// Whatever happens, an undelivered record ends up in the fallback
    /// file before the error is returned - unless writing the fallback
    /// file itself fails, which is the one unrecoverable outcome and
    /// takes precedence.
    pub async fn deliver(&self, mut record: TelemetryRecord) -> Result<Delivery, DeliveryError> {
        if !self.breaker.allow() {
            warn!(
                ingestor = self.ingestor.name(),
                channel = %record.channel,
                "circuit open, persisting record without a delivery attempt"
            );
            self.fallback
                .save(&record, FallbackReason::CircuitOpen)
                .map_err(DeliveryError::FallbackWrite)?;
            return Err(DeliveryError::CircuitOpen);
        }

        record.metadata = Some(RecordMetadata::now());
        let started = Instant::now();

        let result = self
            .retry
            .run(
                "ingest",
                |_err| self.breaker.record_failure(),
                || async { self.ingestor.ingest(std::slice::from_ref(&record)).await },
            )
            .await;

        match result {
            Ok(()) => {
                self.breaker.record_success();
                let latency = started.elapsed();
                info!(
                    ingestor = self.ingestor.name(),
                    channel = %record.channel,
                    latency_s = latency.as_secs_f64(),
                    "record delivered"
                );
                Ok(Delivery { latency })
            }
            Err(source) => {
                let attempts = self.retry.max_attempts();
                error!(
                    ingestor = self.ingestor.name(),
                    channel = %record.channel,
                    attempts,
                    error = %source,
                    "delivery failed, persisting record to fallback"
                );
                self.fallback
                    .save(&record, FallbackReason::RetriesExhausted)
                    .map_err(DeliveryError::FallbackWrite)?;
                Err(DeliveryError::RetriesExhausted { attempts, source })
            }
        }
    }

    /// Probe the backend with a sentinel record
    ///
    /// Uses the plain ingest call - no retry, no breaker gate - and
    /// catches its own failure, so a probe never trips or resets the
    /// breaker and never lands in the fallback store.
    pub async fn health_check(&self) -> HealthStatus {
        let probe = TelemetryRecord::health_probe();
        let started = Instant::now();

        match self.ingestor.ingest(std::slice::from_ref(&probe)).await {
            Ok(()) => {
                let latency = started.elapsed().as_secs_f64();
                debug!(ingestor = self.ingestor.name(), latency_s = latency, "health probe ok");
                HealthStatus {
                    status: HealthState::Healthy,
                    latency: Some(latency),
                    error: None,
                    circuit_breaker_failures: self.breaker.failures(),
                    version: VERSION.to_string(),
                    api_version: API_VERSION.to_string(),
                    protocol: PROTOCOL_VERSION.to_string(),
                }
            }
            Err(e) => HealthStatus {
                status: HealthState::Unhealthy,
                latency: None,
                error: Some(e.to_string()),
                circuit_breaker_failures: self.breaker.failures(),
                version: VERSION.to_string(),
                api_version: API_VERSION.to_string(),
                protocol: PROTOCOL_VERSION.to_string(),
            },
        }
    }

    /// The circuit breaker guarding this client
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// The fallback store behind this client
    pub fn fallback(&self) -> &FallbackStore {
        &self.fallback
    }
}
