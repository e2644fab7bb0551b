//! Persistent, freshness-validated cache of discovered headers.
//!
//! Running the preprocessor to find headers is the slowest step of extraction,
//! so the result for each compiled output is stored next to that output as
//! `<output>.hedron.compile-commands.headers`. An entry is reused only while
//! its action key matches and neither the source nor any listed header has
//! been modified since the entry was written.

#![warn(missing_docs)]

pub mod entry;
pub mod error;
pub mod store;

pub use entry::{HeaderCacheEntry, CACHE_SUFFIX};
pub use error::CacheError;
pub use store::{CacheLookup, HeaderCache, Resolution};
