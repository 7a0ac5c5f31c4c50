//! Durable fallback store for undeliverable records
//!
//! Records that could not reach the backend are appended to a local file,
//! one JSON record per line, keyed by calendar day. This is the last stop:
//! a write failure here has no further recovery path and is surfaced as
//! CRITICAL by the delivery client.
//!
//! After every successful save an opportunistic sweep deletes fallback
//! files whose modification time is older than the retention window.
//! Sweep failures are logged, never propagated.

use crate::error::MonitorError;
use crate::record::{FallbackMetadata, FallbackReason, TelemetryRecord};
use chrono::Utc;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

/// Naming pattern for fallback files: `response_times_fallback_<YYYYMMDD>.json`
pub const FALLBACK_FILE_PREFIX: &str = "response_times_fallback_";
const FALLBACK_FILE_SUFFIX: &str = ".json";

/// Append-only store of records that could not be delivered
pub struct FallbackStore {
    dir: PathBuf,
    retention_days: u64,
    /// Records ever persisted by this store
    total_saved: AtomicU64,
}

impl FallbackStore {
    /// Create a store writing daily files under `dir`
    pub fn new(dir: impl Into<PathBuf>, retention_days: u64) -> Self {
        Self {
            dir: dir.into(),
            retention_days,
            total_saved: AtomicU64::new(0),
        }
    }

    /// Persist one record, annotated with when and why it was saved
    ///
    /// Returns the path written to. An I/O failure here propagates: there
    /// is no secondary fallback.
    pub fn save(
        &self,
        record: &TelemetryRecord,
        reason: FallbackReason,
    ) -> Result<PathBuf, MonitorError> {
        let mut record = record.clone();
        record.fallback = Some(FallbackMetadata::new(reason));

        let path = self.current_file();
        let line = serde_json::to_string(&record)
            .map_err(|e| MonitorError::Serialization(e.to_string()))?;

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{line}")?;

        self.total_saved.fetch_add(1, Ordering::Relaxed);
        info!(
            path = %path.display(),
            reason = %reason,
            "record persisted to fallback file"
        );

        self.prune();
        Ok(path)
    }

    /// Path of the file the next save writes to
    pub fn current_file(&self) -> PathBuf {
        self.dir.join(format!(
            "{}{}{}",
            FALLBACK_FILE_PREFIX,
            Utc::now().format("%Y%m%d"),
            FALLBACK_FILE_SUFFIX
        ))
    }

    /// Records ever persisted by this store
    pub fn total_saved(&self) -> u64 {
        self.total_saved.load(Ordering::Relaxed)
    }

    /// Delete fallback files older than the retention window
    ///
    /// The file written moments ago has a fresh modification time, so a
    /// sweep never removes it.
    fn prune(&self) {
        match self.try_prune() {
            Ok(0) => {}
            Ok(removed) => info!(removed, "pruned expired fallback files"),
            Err(e) => warn!(error = %e, "fallback pruning sweep failed"),
        }
    }

    fn try_prune(&self) -> std::io::Result<usize> {
        let cutoff = Duration::from_secs(self.retention_days * 24 * 60 * 60);
        let now = SystemTime::now();
        let mut removed = 0;

        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if !is_fallback_file(&path) {
                continue;
            }

            let modified = entry.metadata()?.modified()?;
            let age = match now.duration_since(modified) {
                Ok(age) => age,
                // Future mtime, leave it alone
                Err(_) => continue,
            };

            if age > cutoff {
                match std::fs::remove_file(&path) {
                    Ok(()) => {
                        info!(path = %path.display(), "removed expired fallback file");
                        removed += 1;
                    }
                    Err(e) => warn!(path = %path.display(), error = %e, "failed to remove expired fallback file"),
                }
            }
        }

        Ok(removed)
    }
}

fn is_fallback_file(path: &Path) -> bool {
    path.is_file()
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with(FALLBACK_FILE_PREFIX) && n.ends_with(FALLBACK_FILE_SUFFIX))
            .unwrap_or(false)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::record::ChannelStats;
    use std::fs::File;

    fn make_record(channel: &str, duration: f64) -> TelemetryRecord {
        TelemetryRecord::new(channel, duration, ChannelStats::compute(&[duration]))
    }

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    fn age_file(path: &Path, days: u64) {
        let old = SystemTime::now() - Duration::from_secs(days * 24 * 60 * 60);
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(old)
            .unwrap();
    }

    #[test]
    fn test_save_appends_one_annotated_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FallbackStore::new(dir.path(), 7);

        let path = store
            .save(&make_record("chat", 6.0), FallbackReason::RetriesExhausted)
            .unwrap();
        store
            .save(&make_record("voz", 2.0), FallbackReason::CircuitOpen)
            .unwrap();

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["canal"], "chat");
        assert_eq!(lines[0]["_fallback_metadata"]["reason"], "retries_exhausted");
        assert_eq!(lines[1]["_fallback_metadata"]["reason"], "circuit_open");
        assert!(lines[0]["_fallback_metadata"]["saved_at"].is_string());
        assert_eq!(store.total_saved(), 2);
    }

    #[test]
    fn test_file_is_keyed_by_calendar_day() {
        let dir = tempfile::tempdir().unwrap();
        let store = FallbackStore::new(dir.path(), 7);

        let path = store
            .save(&make_record("chat", 1.0), FallbackReason::CircuitOpen)
            .unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        let expected = format!(
            "{}{}{}",
            FALLBACK_FILE_PREFIX,
            Utc::now().format("%Y%m%d"),
            FALLBACK_FILE_SUFFIX
        );
        assert_eq!(name, expected);
    }

    #[test]
    fn test_save_does_not_mutate_the_caller_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FallbackStore::new(dir.path(), 7);

        let record = make_record("chat", 1.0);
        store.save(&record, FallbackReason::CircuitOpen).unwrap();
        assert!(record.fallback.is_none());
    }

    #[test]
    fn test_prune_removes_only_expired_fallback_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FallbackStore::new(dir.path(), 7);

        // An expired fallback file, a recent one, and an unrelated file
        let expired = dir.path().join("response_times_fallback_20200101.json");
        std::fs::write(&expired, "{}\n").unwrap();
        age_file(&expired, 8);

        let recent = dir.path().join("response_times_fallback_20991230.json");
        std::fs::write(&recent, "{}\n").unwrap();
        age_file(&recent, 2);

        let unrelated = dir.path().join("response_times.json");
        std::fs::write(&unrelated, "{}\n").unwrap();
        age_file(&unrelated, 30);

        // The sweep runs after this save
        let written = store
            .save(&make_record("chat", 1.0), FallbackReason::CircuitOpen)
            .unwrap();

        assert!(!expired.exists(), "expired fallback file should be removed");
        assert!(recent.exists(), "recent fallback file should survive");
        assert!(unrelated.exists(), "non-fallback files are never touched");
        assert!(written.exists(), "the just-written file always survives");
    }

    #[test]
    fn test_save_into_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let store = FallbackStore::new(&missing, 7);

        let result = store.save(&make_record("chat", 1.0), FallbackReason::CircuitOpen);
        assert!(matches!(result, Err(MonitorError::Io(_))));
    }
}
