//! Run-wide "already said that" gate for advisories.

use std::collections::HashSet;
use std::sync::Mutex;

/// Advisories that should be shown at most once per run.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum OnceKind {
    /// A compiled source file doesn't exist yet.
    MissingSource,
    /// The explanation printed before the first batch of compiler stderr.
    HeaderSearchBanner,
    /// No output file could be found in an action's arguments.
    OutputUndetected,
}

/// Records which [`OnceKind`]s have fired.
///
/// Shared by reference across worker threads; [`first`](Self::first) returns
/// `true` to exactly one caller per kind.
#[derive(Debug, Default)]
pub struct WarnOnce {
    seen: Mutex<HashSet<OnceKind>>,
}

impl WarnOnce {
    /// Creates a gate with nothing seen.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `kind` as seen, returning `true` if this is the first time.
    pub fn first(&self, kind: OnceKind) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(kind)
    }

    /// Returns `true` if `kind` has already fired.
    pub fn has_fired(&self, kind: OnceKind) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(&kind)
    }
}
