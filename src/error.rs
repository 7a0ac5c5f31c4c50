//! Error types for VASTE

use thiserror::Error;

/// Result type alias for VASTE operations
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Main error type for VASTE
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Lookup of a channel that was never registered
    #[error("unknown channel: {0}")]
    UnknownChannel(String),
}

/// Error type for remote ingestion backends
#[derive(Error, Debug)]
pub enum IngestError {
    /// Initialization failed
    #[error("initialization failed: {0}")]
    Init(String),

    /// Backend rejected the submission
    #[error("send failed: {0}")]
    Send(String),

    /// Connection error (includes timeouts)
    #[error("connection error: {0}")]
    Connection(String),
}

/// Outcome of a failed delivery
///
/// Expected failure paths are variants, not panics, so callers are forced
/// to handle each case. `severity()` drives escalation: only CRITICAL
/// failures fire the escalation hook.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// Delivery short-circuited without a network call
    #[error("circuit breaker open, delivery short-circuited")]
    CircuitOpen,

    /// Every attempt against the backend failed
    #[error("all {attempts} delivery attempts failed: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: IngestError,
    },

    /// Local fallback persistence itself failed - no further recovery path
    #[error("fallback persistence failed: {0}")]
    FallbackWrite(#[source] MonitorError),
}

/// Severity of a delivery failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Critical,
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Critical => write!(f, "critical"),
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

impl DeliveryError {
    /// Severity of this failure
    ///
    /// Retries-exhausted and fallback-write failures are CRITICAL: the
    /// record either left the process only via the fallback file, or not
    /// at all. A short-circuited delivery still reached the fallback file
    /// and clears once the cooldown passes.
    pub fn severity(&self) -> Severity {
        match self {
            Self::CircuitOpen => Severity::Warning,
            Self::RetriesExhausted { .. } => Severity::Critical,
            Self::FallbackWrite(_) => Severity::Critical,
        }
    }
}
