//! Flattening action outputs into compilation database entries.

use std::path::Path;

use compdb_common::{CompileCommandEntry, HeaderSet};

use crate::extractor::ActionOutput;

/// Bazel's launcher stub, which leaks into some action graphs.
pub const LAUNCHER_STUB: &str = "external/bazel_tools/src/tools/launcher/dummy.cc";

/// Builds the database entries for `outputs`, in order.
///
/// Every source gets an entry. A header gets one only the first time it is
/// seen, with the command of the earliest action that includes it.
pub fn emit_entries(outputs: Vec<ActionOutput>, root: &Path) -> Vec<CompileCommandEntry> {
    let directory = root.display().to_string();
    let mut emitted = HeaderSet::new();
    let mut entries = Vec::new();

    for output in outputs {
        let new_headers: Vec<String> = output
            .headers
            .into_iter()
            .filter(|header| emitted.insert(header.clone()))
            .collect();
        for file in output.sources.into_iter().chain(new_headers) {
            if file == LAUNCHER_STUB {
                continue;
            }
            entries.push(CompileCommandEntry {
                file,
                arguments: output.arguments.clone(),
                directory: directory.clone(),
            });
        }
    }
    entries
}
