use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::SnapshotError;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const DEFAULT_RETENTION_DAYS: i64 = 14;

/// Durable index of which snapshot dates exist plus the active retention
/// window. One per storage root, rewritten on every successful snapshot write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub games: GamesIndex,
    pub retention: Retention,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GamesIndex {
    /// UTC instant of the last successful snapshot write.
    pub last_refreshed: DateTime<Utc>,
    /// Known snapshot dates, de-duplicated and ascending.
    pub dates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Retention {
    pub games_days: i64,
}

impl Manifest {
    /// Fresh manifest with no known dates.
    pub fn empty(retention_days: i64) -> Self {
        Manifest {
            games: GamesIndex {
                last_refreshed: DateTime::<Utc>::UNIX_EPOCH,
                dates: Vec::new(),
            },
            retention: Retention {
                games_days: normalize_retention(retention_days),
            },
        }
    }
}

/// Clamp an unset or non-positive retention window to the 14-day default.
pub fn normalize_retention(days: i64) -> i64 {
    if days <= 0 {
        DEFAULT_RETENTION_DAYS
    } else {
        days
    }
}

/// Read the manifest at `path`. Never fails visibly: a missing, unreadable or
/// corrupt file yields a freshly defaulted manifest. The degradation is
/// logged so a wiped index does not go unnoticed.
pub fn read_manifest(path: &Path, default_retention_days: i64) -> Manifest {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Manifest::empty(default_retention_days);
        }
        Err(e) => {
            warn!(
                "Manifest at {} unreadable ({}), starting from defaults",
                path.display(),
                e
            );
            return Manifest::empty(default_retention_days);
        }
    };
    match serde_json::from_str::<Manifest>(&raw) {
        Ok(mut manifest) => {
            manifest.retention.games_days = normalize_retention(manifest.retention.games_days);
            manifest
        }
        Err(e) => {
            warn!(
                "Manifest at {} corrupt ({}), starting from defaults",
                path.display(),
                e
            );
            Manifest::empty(default_retention_days)
        }
    }
}

/// Persist the manifest under `root` with the same temp-then-rename pattern
/// snapshot files use.
pub fn write_manifest(root: &Path, manifest: &Manifest) -> Result<(), SnapshotError> {
    let json = serde_json::to_vec_pretty(manifest)?;
    super::write_atomic(&root.join(MANIFEST_FILE), &json)
}
