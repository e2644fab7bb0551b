//! Recovering the clang invocation hidden behind `emcc`.
//!
//! `emcc` rewrites its arguments heavily before calling clang, so rather than
//! reimplementing it we run it with clang swapped for an interceptor that
//! prints what it receives between two sentinel lines.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use compdb_common::{ActionError, ActionResult};
use compdb_toolchain::{Invocation, ProcessRunner};
use tracing::debug;

/// Printed by the interceptor before its arguments.
pub const BEGIN_ARGS: &str = "===HEDRON_COMPILE_COMMANDS_BEGIN_ARGS===";
/// Printed by the interceptor after its arguments.
pub const END_ARGS: &str = "===HEDRON_COMPILE_COMMANDS_END_ARGS===";

/// Sysroot suffix below the emscripten distribution root.
const SYSROOT_SUFFIX: &str = "emscripten/cache/sysroot";

/// Where to find the interceptor and the emsdk configuration.
#[derive(Debug, Clone)]
pub struct EmscriptenSettings {
    /// Executable `emcc` calls instead of clang.
    pub interceptor: PathBuf,
    /// Workspace-relative path of the emsdk config file.
    pub config: String,
}

/// Replaces an `emcc` command with the clang command it would run.
pub fn unwrap(
    args: &mut Vec<String>,
    action_env: &BTreeMap<String, String>,
    root: &Path,
    runner: &dyn ProcessRunner,
    settings: &EmscriptenSettings,
) -> ActionResult<()> {
    let sysroot = find_sysroot(args)
        .ok_or_else(|| ActionError::new(format!("Emscripten sysroot not found in {args:?}")))?;

    let invocation = Invocation::new(args.iter().cloned())
        .clear_env()
        .envs(action_env)
        .envs(&driver_env(action_env, root, sysroot, settings))
        .current_dir(root);
    let output = runner.run(&invocation)?;

    let recovered = parse_intercepted(&output.stdout).ok_or_else(|| {
        ActionError::new(format!(
            "emcc did not reach its compiler for {args:?}\n{}",
            output.stderr
        ))
    })?;
    debug!(compiler = %recovered[0], "unwrapped emcc");

    *args = recovered;
    if let Some(relative) = Path::new(&args[0])
        .strip_prefix(root)
        .ok()
        .and_then(|p| p.to_str())
    {
        args[0] = relative.to_string();
    }
    Ok(())
}

/// The value of `--sysroot`/`-isysroot` in any of their spellings.
fn find_sysroot(args: &[String]) -> Option<&str> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--sysroot" || arg == "-isysroot" {
            return iter.next().map(String::as_str);
        }
        if let Some(path) = arg
            .strip_prefix("--sysroot=")
            .or_else(|| arg.strip_prefix("-isysroot"))
        {
            return Some(path);
        }
    }
    None
}

fn driver_env(
    action_env: &BTreeMap<String, String>,
    root: &Path,
    sysroot: &str,
    settings: &EmscriptenSettings,
) -> BTreeMap<String, String> {
    let bin_path = sysroot
        .trim_end_matches('/')
        .strip_suffix(SYSROOT_SUFFIX)
        .unwrap_or(sysroot);
    let mut env = BTreeMap::from([
        ("EXT_BUILD_ROOT".to_string(), root.display().to_string()),
        ("EM_BIN_PATH".to_string(), bin_path.to_string()),
        (
            "EM_CONFIG_PATH".to_string(),
            root.join(&settings.config).display().to_string(),
        ),
        ("EMCC_SKIP_SANITY_CHECK".to_string(), "1".to_string()),
        (
            "EM_COMPILER_WRAPPER".to_string(),
            settings.interceptor.display().to_string(),
        ),
    ]);
    if !action_env.contains_key("PATH") {
        if let Ok(path) = std::env::var("PATH") {
            env.insert("PATH".to_string(), path);
        }
    }
    env
}

/// Arguments printed between the sentinel lines, if both are present.
fn parse_intercepted(stdout: &str) -> Option<Vec<String>> {
    let mut lines = stdout.lines().map(|line| line.trim_end_matches('\r'));
    lines.by_ref().find(|line| *line == BEGIN_ARGS)?;
    let mut args = Vec::new();
    for line in lines {
        if line == END_ARGS {
            return (!args.is_empty()).then_some(args);
        }
        args.push(line.to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{strings, FakeRunner};
    use compdb_toolchain::ProcessOutput;

    fn settings() -> EmscriptenSettings {
        EmscriptenSettings {
            interceptor: PathBuf::from("/opt/compdb/compdb-print-args"),
            config: "external/emsdk/emscripten_toolchain/emscripten_config".to_string(),
        }
    }

    fn intercepted(args: &[&str]) -> String {
        format!("noise\n{BEGIN_ARGS}\n{}\n{END_ARGS}\n", args.join("\n"))
    }

    #[test]
    fn sysroot_spellings() {
        assert_eq!(find_sysroot(&strings(&["emcc", "--sysroot", "a"])), Some("a"));
        assert_eq!(find_sysroot(&strings(&["emcc", "--sysroot=b"])), Some("b"));
        assert_eq!(find_sysroot(&strings(&["emcc", "-isysroot", "c"])), Some("c"));
        assert_eq!(find_sysroot(&strings(&["emcc", "-isysrootd"])), Some("d"));
        assert_eq!(find_sysroot(&strings(&["emcc", "-c", "a.c"])), None);
    }

    #[test]
    fn parses_between_sentinels() {
        assert_eq!(
            parse_intercepted(&intercepted(&["clang", "-c", "a.c"])),
            Some(strings(&["clang", "-c", "a.c"]))
        );
        assert_eq!(parse_intercepted("clang -c a.c\n"), None);
        assert_eq!(parse_intercepted(&format!("{BEGIN_ARGS}\nclang\n")), None);
    }

    #[test]
    fn runs_driver_with_redirected_toolchain() {
        let runner = FakeRunner::new(|_| ProcessOutput {
            status: Some(1),
            stdout: intercepted(&["/ws/external/emscripten_bin_linux/bin/clang", "-target", "wasm32", "-c", "a.c"]),
            stderr: String::new(),
        });
        let mut args = strings(&[
            "external/emsdk/emscripten_toolchain/emcc.sh",
            "--sysroot=external/emscripten_bin_linux/emscripten/cache/sysroot",
            "-c",
            "a.c",
        ]);
        let env = BTreeMap::from([("PATH".to_string(), "/bin".to_string())]);
        unwrap(&mut args, &env, Path::new("/ws"), &runner, &settings()).unwrap();

        assert_eq!(
            args,
            strings(&["external/emscripten_bin_linux/bin/clang", "-target", "wasm32", "-c", "a.c"])
        );

        let call = runner.last_call();
        assert!(!call.inherit_env);
        assert_eq!(call.env["EM_BIN_PATH"], "external/emscripten_bin_linux/");
        assert_eq!(call.env["EXT_BUILD_ROOT"], "/ws");
        assert_eq!(call.env["EMCC_SKIP_SANITY_CHECK"], "1");
        assert_eq!(call.env["EM_COMPILER_WRAPPER"], "/opt/compdb/compdb-print-args");
        assert_eq!(call.env["PATH"], "/bin");
        assert!(call.env["EM_CONFIG_PATH"].ends_with("emscripten_toolchain/emscripten_config"));
    }

    #[test]
    fn missing_sentinels_reject_action() {
        let runner = FakeRunner::fixed(1, "", "emcc: error: config not found");
        let mut args = strings(&["emcc", "--sysroot", "s", "-c", "a.c"]);
        let err = unwrap(&mut args, &BTreeMap::new(), Path::new("/ws"), &runner, &settings())
            .unwrap_err();
        assert!(err.message.contains("config not found"));
    }

    #[test]
    fn missing_sysroot_rejects_action_without_running() {
        let runner = FakeRunner::fixed(0, "", "");
        let mut args = strings(&["emcc", "-c", "a.c"]);
        assert!(unwrap(&mut args, &BTreeMap::new(), Path::new("/ws"), &runner, &settings()).is_err());
        assert_eq!(runner.call_count(), 0);
    }
}
