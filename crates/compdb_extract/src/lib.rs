//! Extraction of a compilation database from Bazel compile actions.
//!
//! Each action goes through the same pipeline: its build-system wrapper is
//! unwrapped and cleaned into a standalone command ([`patch`]), the file it
//! compiles is located ([`sources`]), and the headers that file includes
//! are found by asking the compiler itself ([`headers`]). The [`Extractor`]
//! runs this over all actions on a worker pool and [`emit_entries`] turns the
//! results into one entry per source plus one per distinct header.

#![warn(missing_docs)]

pub mod aquery;
pub mod emit;
pub mod error;
pub mod extractor;
pub mod family;
pub mod headers;
pub mod patch;
pub mod sources;

#[cfg(test)]
mod testing;

pub use aquery::{parse_action_graph, read_action_graph};
pub use emit::emit_entries;
pub use error::ExtractError;
pub use extractor::{default_jobs, ActionOutput, ExtractSettings, Extractor};
pub use family::CompilerFamily;
pub use patch::emscripten::{BEGIN_ARGS, END_ARGS};
pub use patch::EmscriptenSettings;
