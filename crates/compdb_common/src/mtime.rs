//! Memoized, adjusted modification times for cache freshness checks.
//!
//! Without memoization most of a fully cached run is spent `stat`ing the same
//! headers over and over, since popular headers appear in thousands of actions.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// How far past "now" a timestamp must be to count as a protected source.
///
/// The build system stamps its internal sources ten years into the future to
/// detect modification; one year is safely below that and well above any
/// plausible clock skew.
const FUTURE_CUTOFF: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Process-lifetime cache of adjusted file modification times.
///
/// The adjusted time is [`UNIX_EPOCH`] (always fresh) for files that do not
/// exist and for files stamped implausibly far in the future; otherwise it is
/// the real modification time. Relative paths are resolved against the
/// workspace root given at construction.
pub struct MtimeCache {
    root: PathBuf,
    cutoff: SystemTime,
    times: Mutex<HashMap<PathBuf, SystemTime>>,
}

impl MtimeCache {
    /// Creates a cache resolving relative paths against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_cutoff(root, SystemTime::now() + FUTURE_CUTOFF)
    }

    /// Creates a cache with an explicit future cutoff.
    pub fn with_cutoff(root: impl Into<PathBuf>, cutoff: SystemTime) -> Self {
        Self {
            root: root.into(),
            cutoff,
            times: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the adjusted modification time of `path`, memoized.
    pub fn adjusted(&self, path: &str) -> SystemTime {
        let full = self.root.join(path);
        if let Some(time) = self.lock().get(&full) {
            return *time;
        }
        let time = self.stat(&full);
        self.lock().insert(full, time);
        time
    }

    /// Returns `true` if neither `path` nor any of `others` is newer than `reference`.
    pub fn none_newer_than<'a, I>(&self, reference: SystemTime, path: &str, others: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        self.adjusted(path) <= reference && others.into_iter().all(|p| self.adjusted(p) <= reference)
    }

    fn stat(&self, full: &Path) -> SystemTime {
        match std::fs::metadata(full).and_then(|m| m.modified()) {
            Ok(modified) if modified <= self.cutoff => modified,
            // Missing files can't get any fresher by rebuilding, and protected
            // sources never change.
            _ => UNIX_EPOCH,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, SystemTime>> {
        self.times.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
