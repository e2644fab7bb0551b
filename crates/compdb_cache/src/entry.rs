//! The on-disk header cache record.

use serde::{Deserialize, Serialize};

/// Suffix appended to an output artifact's path to name its header cache.
pub const CACHE_SUFFIX: &str = ".hedron.compile-commands.headers";

/// A cached header set, tagged with the action key it was discovered for.
///
/// Serialized as the two-element JSON array `[actionKey, [header, ...]]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, Vec<String>)", into = "(String, Vec<String>)")]
pub struct HeaderCacheEntry {
    /// Action key of the action whose headers these are.
    pub action_key: String,
    /// Discovered header paths.
    pub headers: Vec<String>,
}

impl From<(String, Vec<String>)> for HeaderCacheEntry {
    fn from((action_key, headers): (String, Vec<String>)) -> Self {
        Self {
            action_key,
            headers,
        }
    }
}

impl From<HeaderCacheEntry> for (String, Vec<String>) {
    fn from(entry: HeaderCacheEntry) -> Self {
        (entry.action_key, entry.headers)
    }
}
