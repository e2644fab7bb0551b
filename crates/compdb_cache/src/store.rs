//! Lookup, freshness validation, and persistence of header cache entries.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use compdb_common::{ActionResult, HeaderSet, MtimeCache};
use compdb_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use tracing::{debug, warn};

use crate::entry::{HeaderCacheEntry, CACHE_SUFFIX};
use crate::error::CacheError;

/// Headers produced by one run of a header resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// The headers found.
    pub headers: HeaderSet,
    /// `false` when the set is known to be incomplete and must not be persisted.
    pub cacheable: bool,
}

impl Resolution {
    /// A complete header set, safe to persist.
    pub fn complete(headers: HeaderSet) -> Self {
        Self {
            headers,
            cacheable: true,
        }
    }

    /// A possibly truncated header set.
    pub fn partial(headers: HeaderSet) -> Self {
        Self {
            headers,
            cacheable: false,
        }
    }
}

/// Outcome of reading a cache file.
#[derive(Debug)]
pub enum CacheLookup {
    /// No cache file exists for the output.
    Absent,
    /// The file exists but does not decode. Holds the raw contents.
    Corrupted {
        /// What was in the file.
        contents: String,
    },
    /// A decoded entry together with the cache file's modification time.
    Found {
        /// The decoded entry.
        entry: HeaderCacheEntry,
        /// When the cache file was last written.
        written: SystemTime,
    },
}

/// Header caches for every output artifact under one workspace root.
///
/// Holds no in-memory state: each output has its own file, so concurrent
/// workers handling different outputs never contend.
#[derive(Debug, Clone)]
pub struct HeaderCache {
    root: PathBuf,
}

impl HeaderCache {
    /// Creates a cache resolving workspace-relative output paths against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the cache file for an output artifact.
    pub fn path_for(&self, output: &str) -> PathBuf {
        self.root.join(format!("{output}{CACHE_SUFFIX}"))
    }

    /// Reads the cache file for `output`.
    ///
    /// The modification time is taken before the contents are read, so a
    /// concurrent rewrite can only make the entry look older than it is.
    pub fn lookup(&self, output: &str) -> CacheLookup {
        let path = self.path_for(output);
        let written = match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => match meta.modified() {
                Ok(time) => time,
                Err(_) => return CacheLookup::Absent,
            },
            _ => return CacheLookup::Absent,
        };
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable header cache");
                return CacheLookup::Absent;
            }
        };
        match serde_json::from_str::<HeaderCacheEntry>(&contents) {
            Ok(entry) => CacheLookup::Found { entry, written },
            Err(_) => CacheLookup::Corrupted { contents },
        }
    }

    /// Returns `true` if `entry` still describes the action.
    ///
    /// The key must match, and neither the source nor any cached header may
    /// have an adjusted modification time after `written`.
    pub fn is_fresh(
        entry: &HeaderCacheEntry,
        written: SystemTime,
        action_key: &str,
        source: &str,
        mtimes: &MtimeCache,
    ) -> bool {
        entry.action_key == action_key && mtimes.none_newer_than(written, source, &entry.headers)
    }

    /// Persists `headers` for `output`, creating parent directories as needed.
    pub fn store(&self, output: &str, action_key: &str, headers: &HeaderSet) -> Result<(), CacheError> {
        let path = self.path_for(output);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CacheError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let entry = HeaderCacheEntry {
            action_key: action_key.to_string(),
            headers: headers.iter().cloned().collect(),
        };
        let json = serde_json::to_string(&entry).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        std::fs::write(&path, json).map_err(|e| CacheError::Io { path, source: e })
    }

    /// Returns the headers for `output`, from cache when fresh, else via `resolve`.
    ///
    /// A cacheable resolution is written back. A resolution that comes back
    /// empty while a stale entry exists yields the stale headers instead, and
    /// nothing is written. A partial resolution is returned as is without
    /// being persisted. Corrupted cache files are reported as W003 with their
    /// contents attached, then treated as absent.
    pub fn get_or_resolve<F>(
        &self,
        output: &str,
        action_key: &str,
        source: &str,
        mtimes: &MtimeCache,
        sink: &DiagnosticSink,
        resolve: F,
    ) -> ActionResult<HeaderSet>
    where
        F: FnOnce() -> ActionResult<Resolution>,
    {
        let stale = match self.lookup(output) {
            CacheLookup::Found { entry, written } => {
                if Self::is_fresh(&entry, written, action_key, source, mtimes) {
                    debug!(output, "header cache hit");
                    return Ok(entry.headers.into_iter().collect());
                }
                debug!(output, "header cache stale");
                Some(entry)
            }
            CacheLookup::Corrupted { contents } => {
                sink.emit(corrupted_cache(&self.path_for(output), contents));
                None
            }
            CacheLookup::Absent => None,
        };

        let resolution = resolve()?;

        if resolution.headers.is_empty() {
            if let Some(stale) = stale.filter(|entry| !entry.headers.is_empty()) {
                debug!(output, "header discovery came back empty; using stale cache");
                return Ok(stale.headers.into_iter().collect());
            }
        }

        if resolution.cacheable {
            if let Err(e) = self.store(output, action_key, &resolution.headers) {
                warn!(error = %e, "failed to write header cache");
            }
        } else {
            debug!(output, "header set incomplete; not caching");
        }
        Ok(resolution.headers)
    }
}

fn corrupted_cache(path: &Path, contents: String) -> Diagnostic {
    Diagnostic::warning(
        DiagnosticCode::CORRUPTED_CACHE,
        format!("Ignoring corrupted header cache {}", path.display()),
    )
    .with_note("This is okay if you manually killed this tool earlier.")
    .with_note("If it appears spontaneously or frequently, please report it with the cache contents below.")
    .with_detail(contents)
}
