//! Shared foundational types used across the compdb workspace.
//!
//! This crate provides the compile action data model consumed by the pipeline,
//! the compilation database entries it produces, the per-action error kind, and
//! the memoized modification-time lookups used for cache freshness.

#![warn(missing_docs)]

pub mod action;
pub mod mtime;
pub mod result;

pub use action::{CompileAction, CompileCommandEntry, HeaderSet, SourceSet};
pub use mtime::MtimeCache;
pub use result::{ActionError, ActionResult};
