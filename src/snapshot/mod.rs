pub mod manifest;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::SnapshotError;
use crate::store::models::Snapshot;
use manifest::{read_manifest, write_manifest, MANIFEST_FILE};

const GAMES_DIR: &str = "games";

/// Day-keyed snapshot persistence: one pretty-printed JSON file per date under
/// `{root}/games/`, indexed by `{root}/manifest.json`, pruned to a rolling
/// retention window on every write.
///
/// There is no cross-process locking over the storage root. Concurrent
/// writers race on the manifest and the last successful write wins; callers
/// that need more must serialize externally.
pub struct SnapshotStore {
    root: PathBuf,
    retention_days: i64,
    clock: Arc<dyn Clock>,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>, retention_days: i64, clock: Arc<dyn Clock>) -> Self {
        SnapshotStore {
            root: root.into(),
            retention_days: manifest::normalize_retention(retention_days),
            clock,
        }
    }

    fn games_dir(&self) -> PathBuf {
        self.root.join(GAMES_DIR)
    }

    fn snapshot_path(&self, date: &str) -> PathBuf {
        self.games_dir().join(format!("{date}.json"))
    }

    /// Persist one day's snapshot, refresh the manifest and prune dates that
    /// fell out of the retention window.
    ///
    /// The snapshot file and the manifest are each written atomically
    /// (temp-then-rename), so readers never observe either half-written. A
    /// missing or corrupt manifest is replaced rather than failing the write;
    /// prune deletions are best-effort.
    pub fn write_snapshot(&self, date: &str, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        if self.root.as_os_str().is_empty() {
            return Err(SnapshotError::Unconfigured);
        }
        if date.is_empty() {
            return Err(SnapshotError::EmptyDate);
        }

        let mut snapshot = snapshot.clone();
        if snapshot.date.is_empty() {
            snapshot.date = date.to_string();
        }

        let games_dir = self.games_dir();
        fs::create_dir_all(&games_dir)
            .map_err(|e| SnapshotError::io("create", &games_dir, e))?;

        let json = serde_json::to_vec_pretty(&snapshot)?;
        write_atomic(&self.snapshot_path(date), &json)?;

        let mut manifest = read_manifest(&self.root.join(MANIFEST_FILE), self.retention_days);
        manifest.games.last_refreshed = self.clock.now();
        manifest.retention.games_days = self.retention_days;

        // Scan the directory rather than trusting the manifest, and make sure
        // the date just written is present even if the rename is not yet
        // visible to the scan.
        let mut dates = self.scan_dates()?;
        dates.insert(date.to_string());
        manifest.games.dates = self.prune(dates);

        write_manifest(&self.root, &manifest)?;
        info!(
            "Snapshot for {} written ({} games, {} date(s) retained)",
            date,
            snapshot.games.len(),
            manifest.games.dates.len()
        );
        Ok(())
    }

    /// Read one day's snapshot back from disk.
    pub fn read_snapshot(&self, date: &str) -> Result<Snapshot, SnapshotError> {
        if date.is_empty() {
            return Err(SnapshotError::EmptyDate);
        }
        let path = self.snapshot_path(date);
        let raw = fs::read_to_string(&path).map_err(|e| SnapshotError::io("read", &path, e))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Snapshot dates currently present on disk. Non-snapshot files (temp
    /// files, strays) are ignored.
    fn scan_dates(&self) -> Result<BTreeSet<String>, SnapshotError> {
        let dir = self.games_dir();
        let mut dates = BTreeSet::new();
        let entries = fs::read_dir(&dir).map_err(|e| SnapshotError::io("scan", &dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| SnapshotError::io("scan", &dir, e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(date) = name.strip_suffix(".json") {
                if !date.is_empty() {
                    dates.insert(date.to_string());
                }
            }
        }
        Ok(dates)
    }

    /// Drop dates strictly before the retention cutoff, deleting their files.
    /// A date string that does not parse is kept: ambiguous input must never
    /// cause data loss. Delete failures are logged and otherwise ignored.
    fn prune(&self, dates: BTreeSet<String>) -> Vec<String> {
        let cutoff = self.clock.now().date_naive() - Duration::days(self.retention_days);
        let mut retained = Vec::with_capacity(dates.len());
        for date in dates {
            match NaiveDate::parse_from_str(&date, "%Y-%m-%d") {
                Ok(parsed) if parsed < cutoff => {
                    let path = self.snapshot_path(&date);
                    debug!("Pruning snapshot {} (cutoff {})", date, cutoff);
                    if let Err(e) = fs::remove_file(&path) {
                        warn!("Could not delete stale snapshot {}: {}", path.display(), e);
                    }
                }
                Ok(_) => retained.push(date),
                Err(_) => {
                    warn!("Keeping snapshot with unparseable date '{}'", date);
                    retained.push(date);
                }
            }
        }
        // BTreeSet iteration already gave ascending order.
        retained
    }
}

/// Write `bytes` to `path` via a temp file in the same directory plus a
/// rename, so readers only ever see the previous version or the whole new one.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SnapshotError> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).map_err(|e| SnapshotError::io("write", &tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| SnapshotError::io("rename", path, e))
}
