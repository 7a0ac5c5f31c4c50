//! Configuration for VASTE

use crate::error::{MonitorError, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for the monitor
///
/// Credentials come from the `AXIOM_*` variables the backend client
/// expects; everything else is tunable through `VASTE_*` overrides.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Backend API token (`AXIOM_TOKEN`); without one the demo binary
    /// falls back to the stdout backend
    pub token: Option<String>,

    /// Backend organization id (`AXIOM_ORG_ID`)
    pub org_id: Option<String>,

    /// Target dataset name
    pub dataset: String,

    /// Consecutive failures before the circuit opens
    pub failure_threshold: u32,

    /// How long an open circuit short-circuits deliveries
    pub cooldown: Duration,

    /// Total delivery attempts per record (including the first)
    pub max_attempts: u32,

    /// Delay before the first retry; doubles per attempt
    pub initial_delay: Duration,

    /// Upper bound on a single retry delay
    pub max_delay: Duration,

    /// Per-request network timeout on the backend call
    pub request_timeout: Duration,

    /// Days fallback files are kept before the pruning sweep removes them
    pub retention_days: u64,

    /// Always-on local backup file (one JSON record per line)
    pub backup_path: PathBuf,

    /// Directory for fallback files
    pub fallback_dir: PathBuf,

    /// Log level used by the binary's subscriber
    pub log_level: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            token: None,
            org_id: None,
            dataset: "chatbot-monitoring".to_string(),
            failure_threshold: 5,
            cooldown: Duration::from_secs(60),
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            request_timeout: Duration::from_secs(5),
            retention_days: 7,
            backup_path: PathBuf::from("response_times.json"),
            fallback_dir: PathBuf::from("."),
            log_level: "info".to_string(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from environment variables
    ///
    /// Reads a `.env` file first if one is present, then applies
    /// per-variable overrides on top of the defaults.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = MonitorConfig::default();

        if let Ok(token) = env::var("AXIOM_TOKEN") {
            config.token = Some(token);
        }

        if let Ok(org_id) = env::var("AXIOM_ORG_ID") {
            config.org_id = Some(org_id);
        }

        if let Ok(dataset) = env::var("AXIOM_DATASET") {
            config.dataset = dataset;
        }

        if let Ok(threshold) = env::var("VASTE_FAILURE_THRESHOLD") {
            config.failure_threshold = threshold
                .parse()
                .map_err(|e| MonitorError::Config(format!("invalid VASTE_FAILURE_THRESHOLD: {e}")))?;
        }

        if let Ok(secs) = env::var("VASTE_COOLDOWN_SECS") {
            config.cooldown = Duration::from_secs(
                secs.parse()
                    .map_err(|e| MonitorError::Config(format!("invalid VASTE_COOLDOWN_SECS: {e}")))?,
            );
        }

        if let Ok(attempts) = env::var("VASTE_MAX_ATTEMPTS") {
            config.max_attempts = attempts
                .parse()
                .map_err(|e| MonitorError::Config(format!("invalid VASTE_MAX_ATTEMPTS: {e}")))?;
        }

        if let Ok(secs) = env::var("VASTE_INITIAL_DELAY_SECS") {
            config.initial_delay = Duration::from_secs(
                secs.parse().map_err(|e| {
                    MonitorError::Config(format!("invalid VASTE_INITIAL_DELAY_SECS: {e}"))
                })?,
            );
        }

        if let Ok(secs) = env::var("VASTE_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(
                secs.parse().map_err(|e| {
                    MonitorError::Config(format!("invalid VASTE_REQUEST_TIMEOUT_SECS: {e}"))
                })?,
            );
        }

        if let Ok(days) = env::var("VASTE_RETENTION_DAYS") {
            config.retention_days = days
                .parse()
                .map_err(|e| MonitorError::Config(format!("invalid VASTE_RETENTION_DAYS: {e}")))?;
        }

        if let Ok(path) = env::var("VASTE_BACKUP_PATH") {
            config.backup_path = PathBuf::from(path);
        }

        if let Ok(dir) = env::var("VASTE_FALLBACK_DIR") {
            config.fallback_dir = PathBuf::from(dir);
        }

        if let Ok(level) = env::var("VASTE_LOG_LEVEL") {
            config.log_level = level;
        }

        Ok(config)
    }
}
