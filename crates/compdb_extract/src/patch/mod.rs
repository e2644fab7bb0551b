//! Rewriting build-system compiler invocations into standalone ones.
//!
//! Stages run in a fixed order. The unwrap stages reveal the real compiler
//! command, generic cleanup then applies to whatever was revealed, and NVCC
//! translation runs last, after header discovery has used NVCC's own flags.

pub mod apple;
pub mod emscripten;
pub mod generic;
pub mod nvcc;

use std::path::Path;

use compdb_common::{ActionResult, CompileAction};
use compdb_toolchain::{HostToolchain, ProcessRunner};

use crate::family::CompilerFamily;

pub use emscripten::EmscriptenSettings;

/// Host services the patch stages call out to.
#[derive(Clone, Copy)]
pub struct PatchContext<'a> {
    /// Workspace root commands run from.
    pub root: &'a Path,
    /// Apple and `ccache` lookups.
    pub toolchain: &'a dyn HostToolchain,
    /// Runs `emcc` for unwrapping.
    pub runner: &'a dyn ProcessRunner,
    /// Interceptor and config for `emcc`.
    pub emscripten: &'a EmscriptenSettings,
}

/// Unwraps and cleans `action.arguments` in place.
///
/// Returns the family of the command that was revealed, which may differ
/// from the family the action started as.
pub fn despecialize(action: &mut CompileAction, ctx: PatchContext<'_>) -> ActionResult<CompilerFamily> {
    if CompilerFamily::classify(&action.arguments) == CompilerFamily::Emscripten {
        emscripten::unwrap(
            &mut action.arguments,
            &action.environment_variables,
            ctx.root,
            ctx.runner,
            ctx.emscripten,
        )?;
    }
    apple::unwrap(&mut action.arguments, ctx.toolchain)?;
    generic::clean(&mut action.arguments, ctx.toolchain, ctx.root);
    Ok(CompilerFamily::classify(&action.arguments))
}

/// Final rewrites, applied once headers have been resolved.
pub fn finish(family: CompilerFamily, arguments: Vec<String>) -> Vec<String> {
    match family {
        CompilerFamily::Nvcc => nvcc::translate(&arguments),
        _ => arguments,
    }
}
