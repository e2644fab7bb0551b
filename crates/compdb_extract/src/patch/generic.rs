//! Fixes shared by every platform.

use std::path::Path;

use compdb_toolchain::HostToolchain;

/// Module caches pointing into the build sandbox are invalid outside it.
const SANDBOX_MODULE_CACHE: &str = "-fmodules-cache-path=bazel-out/";
/// Only GCC understands this; clang tooling rejects it.
const NO_CANONICAL_SYSTEM_HEADERS: &str = "-fno-canonical-system-headers";
const GCC_TOOLCHAIN: &str = "-gcc-toolchain";
/// clangd mishandles `--sysroot`; `-isysroot` has no `=` form.
const SYSROOT: &str = "--sysroot";
const PREFIX_MAP_PLACEHOLDER: &str = "__BAZEL_";
const PREFIX_MAP_FLAGS: [&str; 3] = [
    "-fdebug-prefix-map=",
    "-ffile-prefix-map=",
    "-fmacro-prefix-map=",
];

/// Removes build-sandbox artifacts and resolves `ccache` shims.
///
/// The command is meant to run in place from the workspace root, so path
/// remapping flags that reference sandbox placeholders are dropped along with
/// flags the target tooling does not accept. `--sysroot` is respelled as
/// `-isysroot`. Applying it twice is the same as applying it once.
pub fn clean(args: &mut Vec<String>, toolchain: &dyn HostToolchain, root: &Path) {
    let mut skip_value = false;
    args.retain(|arg| {
        if skip_value {
            skip_value = false;
            return false;
        }
        if arg.starts_with(GCC_TOOLCHAIN) {
            skip_value = arg.len() == GCC_TOOLCHAIN.len();
            return false;
        }
        !(arg.starts_with(SANDBOX_MODULE_CACHE)
            || arg == NO_CANONICAL_SYSTEM_HEADERS
            || is_sandbox_prefix_map(arg))
    });
    for arg in args.iter_mut() {
        if let Some(rest) = arg.strip_prefix(SYSROOT) {
            *arg = format!("-isysroot{}", rest.strip_prefix('=').unwrap_or(rest));
        }
    }

    if let Some(real) = args.first().and_then(|cc| toolchain.real_compiler(cc, root)) {
        args[0] = real;
    }
}

fn is_sandbox_prefix_map(arg: &str) -> bool {
    arg.starts_with("DEBUG_PREFIX_MAP_PWD")
        || (PREFIX_MAP_FLAGS.iter().any(|flag| arg.starts_with(flag))
            && arg.contains(PREFIX_MAP_PLACEHOLDER))
}
