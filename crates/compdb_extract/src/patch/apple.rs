//! Unwrapping Bazel's Xcode compiler wrapper.
//!
//! On Apple platforms Bazel compiles through `wrapped_clang`, which expands
//! `__BAZEL_XCODE_*__` macros at execution time. Here the macros are expanded
//! ahead of time and the wrapper is replaced by the active Xcode `clang`.

use std::sync::LazyLock;

use compdb_common::{ActionError, ActionResult};
use compdb_toolchain::HostToolchain;
use regex::Regex;

const XCODE_MARKER: &str = "__BAZEL_XCODE_";
const DEVELOPER_DIR_MACRO: &str = "__BAZEL_XCODE_DEVELOPER_DIR__";
const SDK_ROOT_MACRO: &str = "__BAZEL_XCODE_SDKROOT__";

static PLATFORM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/Platforms/([a-zA-Z]+)\.platform/Developer/").unwrap());

/// Returns `true` if the command goes through the Xcode wrapper.
pub fn is_wrapped(args: &[String]) -> bool {
    args.iter().any(|arg| arg.contains(XCODE_MARKER))
}

/// Replaces the wrapper with the active compiler and expands its macros.
///
/// The SDK is named by the first `/Platforms/<Name>.platform/Developer/` path
/// in the command; without one the SDK root can't be substituted safely and
/// the action is rejected.
pub fn unwrap(args: &mut [String], toolchain: &dyn HostToolchain) -> ActionResult<()> {
    if args.is_empty() || !is_wrapped(args) {
        return Ok(());
    }

    args[0] = toolchain.apple_active_compiler()?;

    if args.iter().any(|arg| arg.contains(DEVELOPER_DIR_MACRO)) {
        let developer_dir = toolchain.apple_developer_dir()?;
        substitute(args, DEVELOPER_DIR_MACRO, &developer_dir);
    }

    if args.iter().any(|arg| arg.contains(SDK_ROOT_MACRO)) {
        let platform = args
            .iter()
            .find_map(|arg| PLATFORM.captures(arg))
            .map(|caps| caps[1].to_string())
            .ok_or_else(|| ActionError::new(format!("Apple platform not detected in {args:?}")))?;
        let sdk_root = toolchain.apple_sdk_root(&platform)?;
        substitute(args, SDK_ROOT_MACRO, &sdk_root);
    }

    Ok(())
}

fn substitute(args: &mut [String], placeholder: &str, value: &str) {
    for arg in args.iter_mut().filter(|arg| arg.contains(placeholder)) {
        *arg = arg.replace(placeholder, value);
    }
}
