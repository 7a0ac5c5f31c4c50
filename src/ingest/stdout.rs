//! Stdout ingestor for dry runs
//!
//! Prints records instead of sending them anywhere. Used by the demo
//! binary when no backend credentials are configured, and handy in
//! development.

use crate::error::IngestError;
use crate::ingest::Ingestor;
use crate::record::TelemetryRecord;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

/// Stdout ingestor - prints records for inspection
pub struct StdoutIngestor {
    /// Pretty print records as a readable block
    pretty: bool,
    /// Count of records printed
    ingested_count: AtomicU64,
}

impl StdoutIngestor {
    /// Create a new StdoutIngestor printing one JSON line per record
    pub fn new() -> Self {
        Self {
            pretty: false,
            ingested_count: AtomicU64::new(0),
        }
    }

    /// Create a new StdoutIngestor with pretty printing
    pub fn pretty() -> Self {
        Self {
            pretty: true,
            ingested_count: AtomicU64::new(0),
        }
    }

    /// Total records printed
    pub fn ingested_count(&self) -> u64 {
        self.ingested_count.load(Ordering::Relaxed)
    }
}

impl Default for StdoutIngestor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ingestor for StdoutIngestor {
    fn name(&self) -> &'static str {
        "stdout"
    }

    async fn ingest(&self, records: &[TelemetryRecord]) -> Result<(), IngestError> {
        use std::io::Write;

        let mut stdout = std::io::stdout().lock();

        for record in records {
            if self.pretty {
                writeln!(
                    stdout,
                    "┌─ Record ────────────────────────────────────────────",
                )
                .ok();
                writeln!(stdout, "│ Channel:   {}", record.channel).ok();
                writeln!(stdout, "│ Duration:  {:.2}s", record.duration).ok();
                writeln!(stdout, "│ Above SLA: {}", record.above_sla).ok();
                writeln!(stdout, "│ Timestamp: {}", record.timestamp.to_rfc3339()).ok();
                writeln!(
                    stdout,
                    "│ Stats:     mean {:.2}s over {} records ({} SLA violations)",
                    record.channel_stats.mean,
                    record.channel_stats.count,
                    record.channel_stats.sla_violations
                )
                .ok();
                writeln!(
                    stdout,
                    "└─────────────────────────────────────────────────────",
                )
                .ok();
            } else {
                let line = serde_json::to_string(record)
                    .map_err(|e| IngestError::Send(format!("Failed to serialize record: {}", e)))?;
                writeln!(stdout, "{line}").ok();
            }
        }

        self.ingested_count
            .fetch_add(records.len() as u64, Ordering::Relaxed);
        Ok(())
    }
}
