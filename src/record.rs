//! The telemetry record envelope
//!
//! One flat record per measurement flows through the whole pipeline:
//! recorder → delivery client → remote backend, with the same shape
//! appended to the local backup and fallback files. The serialized field
//! names are pinned because the local files are read by downstream
//! analysis tooling; the struct field names stay idiomatic Rust.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Monitor version stamped on every record
pub const VERSION: &str = "1.0.0";
/// Backend API version reported by the health check
pub const API_VERSION: &str = "v1";
/// Transport protocol tag reported by the health check
pub const PROTOCOL_VERSION: &str = "TLS 1.2";

/// Maximum acceptable response duration in seconds
pub const SLA_THRESHOLD: f64 = 5.0;

/// Channels tracked from process start
pub const DEFAULT_CHANNELS: [&str; 3] = ["chat", "voz", "email"];
/// Catch-all bucket for measurements on unrecognized channels
pub const FALLBACK_CHANNEL: &str = "outro";

/// Per-channel statistics over the entire buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    /// Mean duration in seconds
    #[serde(rename = "media")]
    pub mean: f64,

    /// Fastest recorded duration
    pub min: f64,

    /// Slowest recorded duration
    pub max: f64,

    /// Number of recorded durations
    #[serde(rename = "total_registros")]
    pub count: usize,

    /// Durations exceeding [`SLA_THRESHOLD`]
    #[serde(rename = "violacoes_sla")]
    pub sla_violations: usize,
}

impl ChannelStats {
    /// Compute stats over a channel buffer; all zeros for an empty buffer
    pub fn compute(durations: &[f64]) -> Self {
        if durations.is_empty() {
            return Self {
                mean: 0.0,
                min: 0.0,
                max: 0.0,
                count: 0,
                sla_violations: 0,
            };
        }

        let count = durations.len();
        let sum: f64 = durations.iter().sum();

        Self {
            mean: sum / count as f64,
            min: durations.iter().copied().fold(f64::INFINITY, f64::min),
            max: durations.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            count,
            sla_violations: durations.iter().filter(|&&d| d > SLA_THRESHOLD).count(),
        }
    }
}

/// Send-time metadata stamped by the delivery client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub version: String,
    pub api_version: String,
    pub protocol: String,
    /// Timestamp of send start, not of measurement
    pub timestamp: DateTime<Utc>,
}

impl RecordMetadata {
    pub fn now() -> Self {
        Self {
            version: VERSION.to_string(),
            api_version: API_VERSION.to_string(),
            protocol: PROTOCOL_VERSION.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Why a record landed in the fallback store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// The circuit breaker was open; no delivery was attempted
    CircuitOpen,
    /// Every delivery attempt failed
    RetriesExhausted,
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CircuitOpen => write!(f, "circuit_open"),
            Self::RetriesExhausted => write!(f, "retries_exhausted"),
        }
    }
}

/// Persistence metadata stamped by the fallback store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackMetadata {
    pub saved_at: DateTime<Utc>,
    pub reason: FallbackReason,
}

impl FallbackMetadata {
    pub fn new(reason: FallbackReason) -> Self {
        Self {
            saved_at: Utc::now(),
            reason,
        }
    }
}

/// One response-time measurement, enriched with channel statistics
///
/// Immutable once built; the delivery client stamps `_metadata` on its own
/// copy at send start, and the fallback store stamps `_fallback_metadata`
/// on the copy it persists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryRecord {
    /// Measurement timestamp
    pub timestamp: DateTime<Utc>,

    /// Channel the response was served on
    #[serde(rename = "canal")]
    pub channel: String,

    /// Response duration in seconds
    #[serde(rename = "tempo_resposta")]
    pub duration: f64,

    /// Whether this measurement violates the SLA
    #[serde(rename = "acima_sla")]
    pub above_sla: bool,

    /// Monitor version that produced the record
    pub version: String,

    /// Stats over the channel's whole buffer, including this measurement
    #[serde(rename = "metricas_canal")]
    pub channel_stats: ChannelStats,

    /// Stamped by the delivery client at send start
    #[serde(
        rename = "_metadata",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub metadata: Option<RecordMetadata>,

    /// Stamped by the fallback store at persistence
    #[serde(
        rename = "_fallback_metadata",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub fallback: Option<FallbackMetadata>,
}

impl TelemetryRecord {
    /// Build a record for one measurement
    pub fn new(channel: impl Into<String>, duration: f64, channel_stats: ChannelStats) -> Self {
        Self {
            timestamp: Utc::now(),
            channel: channel.into(),
            duration,
            above_sla: duration > SLA_THRESHOLD,
            version: VERSION.to_string(),
            channel_stats,
            metadata: None,
            fallback: None,
        }
    }

    /// Sentinel record sent by the health check
    pub fn health_probe() -> Self {
        Self::new("health_check", 0.0, ChannelStats::compute(&[]))
    }
}
