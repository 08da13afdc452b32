use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

/// Suffix appended to wall-clock stamps when the referenced file could not be found.
pub const MISSING_MARKER: &str = "-m";

/// Cache-busting token written into the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// Last-modified time of the referenced file, in epoch milliseconds.
    Modified(i64),
    /// Wall-clock time used because the file was not found, in epoch milliseconds.
    Missing(i64),
}

impl Timestamp {
    /// Returns `true` when the stamp was taken from the wall clock.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing(_))
    }

    /// Millisecond value regardless of origin.
    pub fn millis(&self) -> i64 {
        match self {
            Self::Modified(value) | Self::Missing(value) => *value,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Modified(value) => write!(f, "{value}"),
            Self::Missing(value) => write!(f, "{value}{MISSING_MARKER}"),
        }
    }
}

/// Filesystem and clock access needed to stamp a reference.
pub trait AssetStat {
    /// Last-modified time of `path` in epoch milliseconds, or `None` when it does not exist.
    fn modified_millis(&self, path: &Path) -> Option<i64>;

    /// Current wall-clock time in epoch milliseconds.
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// [`AssetStat`] backed by `std::fs`. Every call re-stats the file.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStat;

impl AssetStat for FsStat {
    fn modified_millis(&self, path: &Path) -> Option<i64> {
        let modified = fs::metadata(path).ok()?.modified().ok()?;
        Some(DateTime::<Utc>::from(modified).timestamp_millis())
    }
}

/// Resolve the stamp for `filename` relative to `base_path` using the real filesystem.
pub fn resolve_timestamp(filename: &str, base_path: &Path) -> Timestamp {
    resolve_timestamp_with(&FsStat, filename, base_path)
}

/// Resolve the stamp for `filename` relative to `base_path`.
///
/// An empty `base_path` disables lookups, so the reference is always stamped as missing.
pub fn resolve_timestamp_with<S: AssetStat + ?Sized>(
    stat: &S,
    filename: &str,
    base_path: &Path,
) -> Timestamp {
    if base_path.as_os_str().is_empty() {
        return Timestamp::Missing(stat.now_millis());
    }

    let candidate = candidate_path(base_path, filename);
    match stat.modified_millis(&candidate) {
        Some(modified) => Timestamp::Modified(modified),
        None => {
            log::trace!("asset not found at {}", candidate.display());
            Timestamp::Missing(stat.now_millis())
        }
    }
}

/// Join a reference pathname onto the base directory.
///
/// Leading slashes are stripped first so a root-relative reference stays inside `base_path`.
pub fn candidate_path(base_path: &Path, filename: &str) -> PathBuf {
    base_path.join(filename.trim_start_matches('/'))
}
