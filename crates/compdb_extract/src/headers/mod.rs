//! Finding the headers a compile command includes.
//!
//! The compiler's own preprocessor is the oracle: GCC-style drivers print
//! makefile dependencies, MSVC-style drivers trace includes on stderr. Both
//! are slow, so results are cached next to the action's output file.

pub mod gcc;
pub mod makefile;
pub mod msvc;

use std::path::Path;

use compdb_cache::HeaderCache;
use compdb_common::{ActionResult, CompileAction, HeaderSet, MtimeCache};
use compdb_config::HeaderExclusion;
use compdb_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, OnceKind};
use compdb_toolchain::ProcessRunner;

use crate::family::CompilerFamily;

/// Services and settings shared by every header lookup in a run.
#[derive(Clone, Copy)]
pub struct HeaderContext<'a> {
    /// Workspace root; discovery commands run here.
    pub root: &'a Path,
    /// Runs the preprocessor.
    pub runner: &'a dyn ProcessRunner,
    /// Receives compiler output and cache problems.
    pub sink: &'a DiagnosticSink,
    /// Per-output header caches.
    pub cache: &'a HeaderCache,
    /// Modification times for cache freshness.
    pub mtimes: &'a MtimeCache,
    /// Which headers to leave out.
    pub exclusion: HeaderExclusion,
    /// `INCLUDE` for `cl.exe`.
    pub msvc_include_paths: &'a [String],
}

/// Returns `true` for the single-argument output spellings.
pub(crate) fn is_output_flag(arg: &str) -> bool {
    arg.starts_with("/Fo") || arg.starts_with("-Fo") || arg.starts_with("--output=")
}

/// The object file a compile command writes, if it can be told from its arguments.
pub fn output_file(args: &[String]) -> Option<String> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "-o" || arg == "--output" {
            return iter.next().cloned();
        }
        if let Some(output) = arg
            .strip_prefix("/Fo")
            .or_else(|| arg.strip_prefix("-Fo"))
            .or_else(|| arg.strip_prefix("--output="))
        {
            return Some(output.to_string());
        }
    }
    None
}

/// Returns `true` if `path` belongs to the main workspace and not to an external repository.
///
/// Relative paths are taken relative to `root`. Generated files of external
/// repositories, under `bazel-out/<config>/bin/external/`, count as external.
pub fn is_in_main_workspace(path: &str, root: &Path) -> bool {
    let path = Path::new(path);
    let relative = if path.is_absolute() {
        match path.strip_prefix(root) {
            Ok(relative) => relative,
            Err(_) => return false,
        }
    } else {
        path
    };
    if relative.starts_with("external") {
        return false;
    }
    let parts: Vec<_> = relative.iter().collect();
    !(parts.len() > 3 && parts[0] == "bazel-out" && parts[3] == "external")
}

/// Headers included by the already patched `action`, which compiles `source`.
///
/// Uses the cached set when it is still fresh. A command whose output file
/// can't be detected is resolved without caching.
pub fn find_headers(
    action: &CompileAction,
    source: &str,
    family: CompilerFamily,
    ctx: &HeaderContext<'_>,
) -> ActionResult<HeaderSet> {
    match ctx.exclusion {
        HeaderExclusion::All => return Ok(HeaderSet::new()),
        // An external action can't include main-workspace headers.
        HeaderExclusion::External if action.is_external => return Ok(HeaderSet::new()),
        _ => {}
    }

    let resolve = || {
        if family.is_msvc() {
            msvc::resolve(action, source, ctx)
        } else {
            gcc::resolve(action, source, family, ctx)
        }
    };
    let headers = match output_file(&action.arguments) {
        Some(output) => ctx.cache.get_or_resolve(
            &output,
            &action.action_key,
            source,
            ctx.mtimes,
            ctx.sink,
            resolve,
        )?,
        None => {
            ctx.sink.emit_once(OnceKind::OutputUndetected, || {
                Diagnostic::warning(
                    DiagnosticCode::OUTPUT_UNDETECTED,
                    format!("Output file not detected in arguments {:?}", action.arguments),
                )
                .with_note("Not a big deal; things will work but will be a little slower.")
                .with_note("Please report this so the output flag can be recognised.")
            });
            resolve()?.headers
        }
    };

    if ctx.exclusion == HeaderExclusion::External {
        return Ok(headers
            .into_iter()
            .filter(|header| is_in_main_workspace(header, ctx.root))
            .collect());
    }
    Ok(headers)
}

/// Surfaces compiler output seen while locating headers.
///
/// The explanation is printed once per run; the output itself every time.
pub(crate) fn report_compiler_output(sink: &DiagnosticSink, source: &str, output: String) {
    sink.emit_once(OnceKind::HeaderSearchBanner, || {
        Diagnostic::warning(
            DiagnosticCode::HEADER_SEARCH_OUTPUT,
            "While locating the headers you use, we encountered a compiler warning or error.",
        )
        .with_note("No need to worry; your code doesn't have to compile for this tool to work.")
        .with_note("The output is shown in case it helps you fix it.")
        .with_note(
            "If it is about missing files that the build should generate, build with --keep_going first.",
        )
        .with_note(
            "If you have already built successfully, make sure this tool sees the same flags you build with.",
        )
    });
    sink.emit(
        Diagnostic::warning(
            DiagnosticCode::HEADER_SEARCH_OUTPUT,
            format!("Compiler output while locating headers for {source}"),
        )
        .with_detail(output),
    );
}
