//! Response-time recording and per-channel metrics
//!
//! The recorder owns the per-channel buffers and the one delivery client.
//! Every measurement is enriched with channel statistics, handed to the
//! delivery client, appended to the always-on local backup file, and
//! checked against the SLA - in that order, and each step independent of
//! the previous one's outcome: a dead backend never costs a measurement.

use crate::config::MonitorConfig;
use crate::deliver::{DeliveryClient, HealthState};
use crate::error::{DeliveryError, MonitorError, Severity};
use crate::record::{
    ChannelStats, TelemetryRecord, DEFAULT_CHANNELS, FALLBACK_CHANNEL, SLA_THRESHOLD,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Hook invoked on CRITICAL delivery failures
///
/// The default hook logs loudly; installing a custom one is how a pager
/// or chat notification gets wired in.
pub type EscalationHook = Box<dyn Fn(&DeliveryError) + Send + Sync>;

/// Records response times per channel and forwards each measurement
/// through the resilient delivery path
pub struct ResponseTimeRecorder {
    channels: Mutex<HashMap<String, Vec<f64>>>,
    client: DeliveryClient,
    backup_path: PathBuf,
    escalation: EscalationHook,
}

impl ResponseTimeRecorder {
    /// Create a recorder and verify the backend integration
    ///
    /// The verification is one health probe, logged either way; an
    /// unreachable backend degrades the recorder, it never prevents
    /// construction.
    pub async fn new(client: DeliveryClient, config: &MonitorConfig) -> Self {
        let status = client.health_check().await;
        match status.status {
            HealthState::Healthy => info!(
                latency_s = status.latency,
                version = %status.version,
                api_version = %status.api_version,
                "backend integration verified"
            ),
            HealthState::Unhealthy => warn!(
                error = status.error.as_deref().unwrap_or("unknown error"),
                circuit_breaker_failures = status.circuit_breaker_failures,
                "backend integration degraded, deliveries will rely on the fallback path"
            ),
        }

        let channels = DEFAULT_CHANNELS
            .iter()
            .map(|&name| (name.to_string(), Vec::new()))
            .collect();

        Self {
            channels: Mutex::new(channels),
            client,
            backup_path: config.backup_path.clone(),
            escalation: Box::new(|err| {
                error!(
                    error = %err,
                    "CRITICAL failure in the monitoring pipeline - escalating"
                );
            }),
        }
    }

    /// Replace the CRITICAL-failure escalation hook
    pub fn with_escalation(mut self, hook: EscalationHook) -> Self {
        self.escalation = hook;
        self
    }

    /// Record one response-time measurement
    ///
    /// Measurements on unrecognized channels land in the catch-all
    /// bucket, which is created on first use. Delivery failures are
    /// handled here (escalated when CRITICAL) and never surface to the
    /// caller; the local backup line and the SLA check always run.
    pub async fn record(&self, channel: &str, duration: f64) {
        let (channel, stats) = {
            let mut channels = self.channels.lock();
            let key = if channels.contains_key(channel) {
                channel.to_string()
            } else {
                warn!(
                    channel,
                    catch_all = FALLBACK_CHANNEL,
                    "unrecognized channel, recording under catch-all bucket"
                );
                FALLBACK_CHANNEL.to_string()
            };
            let buffer = channels.entry(key.clone()).or_default();
            buffer.push(duration);
            (key, ChannelStats::compute(buffer))
        };

        let record = TelemetryRecord::new(channel, duration, stats);

        match self.client.deliver(record.clone()).await {
            Ok(delivery) => debug!(
                channel = %record.channel,
                latency_s = delivery.latency.as_secs_f64(),
                "measurement delivered"
            ),
            Err(err) if err.severity() == Severity::Critical => {
                error!(channel = %record.channel, error = %err, "measurement delivery failed");
                (self.escalation)(&err);
            }
            Err(err) => {
                warn!(
                    channel = %record.channel,
                    error = %err,
                    "measurement delivery deferred to fallback"
                );
            }
        }

        if let Err(e) = self.write_backup(&record) {
            error!(
                path = %self.backup_path.display(),
                error = %e,
                "failed to write local backup line"
            );
        }

        if record.above_sla {
            let alert = format!(
                "ALERT: response time of {:.2}s on channel '{}' exceeds the {}s SLA",
                record.duration, record.channel, SLA_THRESHOLD
            );
            println!("{alert}");
            warn!(
                channel = %record.channel,
                duration_s = record.duration,
                sla_s = SLA_THRESHOLD,
                "SLA violation"
            );
        }
    }

    /// Per-channel mean duration, rounded to two decimals
    ///
    /// Channels with no measurements report 0.
    pub fn aggregate(&self) -> HashMap<String, f64> {
        self.channels
            .lock()
            .iter()
            .map(|(channel, durations)| {
                let mean = if durations.is_empty() {
                    0.0
                } else {
                    let raw: f64 = durations.iter().sum::<f64>() / durations.len() as f64;
                    (raw * 100.0).round() / 100.0
                };
                (channel.clone(), mean)
            })
            .collect()
    }

    /// Full statistics for one registered channel
    pub fn stats_for(&self, channel: &str) -> Result<ChannelStats, MonitorError> {
        let channels = self.channels.lock();
        channels
            .get(channel)
            .map(|durations| ChannelStats::compute(durations))
            .ok_or_else(|| MonitorError::UnknownChannel(channel.to_string()))
    }

    /// Names of all channels with a buffer, sorted
    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Probe the backend through the delivery client
    pub async fn health_check(&self) -> crate::deliver::HealthStatus {
        self.client.health_check().await
    }

    /// Append the record to the always-on local backup file
    ///
    /// One JSON object per line, same shape as the wire record minus the
    /// send metadata.
    fn write_backup(&self, record: &TelemetryRecord) -> Result<(), MonitorError> {
        let line = serde_json::to_string(record)
            .map_err(|e| MonitorError::Serialization(e.to_string()))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.backup_path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}
