//! Translating NVCC command lines into clang's CUDA dialect.
//!
//! Runs after header discovery, which needs NVCC's own `-M`. The result is
//! what clang-based tools will parse, so NVCC-only options are dropped and
//! NVCC's long option names and comma lists are spelled the clang way.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Clang options that bring its CUDA parsing closer to NVCC's.
const COMPAT_FLAGS: [&str; 2] = ["-Xclang", "-fcuda-allow-variadic-functions"];

/// Comma-list options that clang already understands.
const NATIVE_COMMA_PREFIXES: [&str; 5] = ["-Wl,", "-Wa,", "-Wp,", "-fsanitize", "-fno-sanitize"];

/// NVCC-only options that take no value.
const NO_VALUE: &[&str] = &[
    "--cuda", "-cuda",
    "--cubin", "-cubin",
    "--fatbin", "-fatbin",
    "--ptx", "-ptx",
    "--optix-ir", "-optix-ir",
    "--device-c", "-dc",
    "--device-w", "-dw",
    "--device-link", "-dlink",
    "--link", "-link",
    "--lib", "-lib",
    "--run", "-run",
    "--dlink-time-opt", "-dlto",
    "--gen-opt-lto", "-gen-opt-lto",
    "--no-host-device-initializer-list", "-nohdinitlist",
    "--no-host-device-move-forward", "-nohdmoveforward",
    "--expt-relaxed-constexpr", "-expt-relaxed-constexpr",
    "--extended-lambda", "-extended-lambda",
    "--expt-extended-lambda", "-expt-extended-lambda",
    "--generate-line-info", "-lineinfo",
    "--use_fast_math", "-use_fast_math",
    "--keep", "-keep",
    "--save-temps", "-save-temps",
    "--clean-targets", "-clean",
    "--no-align-double",
    "--no-device-link", "-nodlink",
    "--restrict", "-restrict",
    "--resource-usage", "-res-usage",
    "--no-exceptions", "-noeh",
    "--allow-unsupported-compiler", "-allow-unsupported-compiler",
    "--Wno-deprecated-gpu-targets", "-Wno-deprecated-gpu-targets",
    "--Wdefault-stream-launch", "-Wdefault-stream-launch",
    "--Wext-lambda-captures-this", "-Wext-lambda-captures-this",
    "--display-error-number", "-err-no",
    "--no-display-error-number", "-no-err-no",
    "--source-in-ptx", "-src-in-ptx",
    "--keep-device-functions", "-keep-device-functions",
    "--device-debug", "-G",
    "--extensible-whole-program", "-ewp",
    "--list-gpu-code", "-code-ls",
    "--list-gpu-arch", "-arch-ls",
    "--dryrun", "-dryrun",
    "--forward-unknown-to-host-compiler", "-forward-unknown-to-host-compiler",
    "--forward-unknown-to-host-linker", "-forward-unknown-to-host-linker",
    "--dont-use-profile", "-noprof",
];

/// NVCC-only options followed by a value.
const WITH_VALUE: &[&str] = &[
    "--generate-code", "-gencode",
    "--gpu-architecture", "-arch",
    "--gpu-code", "-code",
    "--compiler-options", "-Xcompiler",
    "--compiler-bindir", "-ccbin",
    "--ptxas-options", "-Xptxas",
    "--nvlink-options", "-Xnvlink",
    "--archive-options", "-Xarchive",
    "--cudart", "-cudart",
    "--cudadevrt", "-cudadevrt",
    "--default-stream", "-default-stream",
    "--diag-suppress", "-diag-suppress",
    "--diag-error", "-diag-error",
    "--diag-warn", "-diag-warn",
    "--fmad", "-fmad",
    "--ftz", "-ftz",
    "--prec-div", "-prec-div",
    "--prec-sqrt", "-prec-sqrt",
    "--maxrregcount", "-maxrregcount",
    "--relocatable-device-code", "-rdc",
    "--threads", "-t",
    "--keep-dir", "-keep-dir",
    "--options-file", "-optf",
    "--output-directory", "-odir",
    "--split-compile", "-split-compile",
    "--drive-prefix", "-dp",
    "--input-drive-prefix", "-idp",
    "--dependency-drive-prefix", "-ddp",
    "--machine", "-m",
    "--run-args", "-run-args",
    "--entries", "-e",
    "--optimization-info", "-opt-info",
];

/// How a rewritten option carries its value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Value {
    /// A flag on its own.
    None,
    /// Glued to the option, as in `-Ipath`.
    Attached,
    /// Joined with `=`, as in `-std=c++17`.
    Equals,
    /// The following token.
    Separate,
}

/// NVCC spellings that clang knows under another name or value syntax.
static REWRITES: LazyLock<HashMap<&'static str, (&'static str, Value)>> = LazyLock::new(|| {
    HashMap::from([
        ("--compile", ("-c", Value::None)),
        ("--debug", ("-g", Value::None)),
        ("--preprocess", ("-E", Value::None)),
        ("--generate-dependencies", ("-M", Value::None)),
        ("--generate-nonsystem-dependencies", ("-MM", Value::None)),
        ("--generate-dependencies-with-compile", ("-MD", Value::None)),
        ("--generate-nonsystem-dependencies-with-compile", ("-MMD", Value::None)),
        ("--shared", ("-shared", Value::None)),
        ("--disable-warnings", ("-w", Value::None)),
        ("--verbose", ("-v", Value::None)),
        ("--define-macro", ("-D", Value::Attached)),
        ("--undefine-macro", ("-U", Value::Attached)),
        ("--include-path", ("-I", Value::Attached)),
        ("--library", ("-l", Value::Attached)),
        ("--library-path", ("-L", Value::Attached)),
        ("--optimize", ("-O", Value::Attached)),
        ("-O", ("-O", Value::Attached)),
        ("--std", ("-std", Value::Equals)),
        ("-std", ("-std", Value::Equals)),
        ("--ftemplate-depth", ("-ftemplate-depth", Value::Equals)),
        ("-ftemplate-depth", ("-ftemplate-depth", Value::Equals)),
        ("--ftemplate-backtrace-limit", ("-ftemplate-backtrace-limit", Value::Equals)),
        ("-ftemplate-backtrace-limit", ("-ftemplate-backtrace-limit", Value::Equals)),
        ("--system-include", ("-isystem", Value::Separate)),
        ("--pre-include", ("-include", Value::Separate)),
        ("--output-file", ("-o", Value::Separate)),
        ("--dependency-output", ("-MF", Value::Separate)),
        ("--dependency-target-name", ("-MT", Value::Separate)),
        ("--linker-options", ("-Xlinker", Value::Separate)),
        ("--x", ("-x", Value::Separate)),
    ])
});

/// Rewrites an NVCC command line into one clang accepts.
pub fn translate(args: &[String]) -> Vec<String> {
    let Some((program, rest)) = args.split_first() else {
        return Vec::new();
    };
    let mut out = vec![program.clone()];
    out.extend(COMPAT_FLAGS.iter().map(|flag| flag.to_string()));

    let mut rest = rest.iter();
    while let Some(arg) = rest.next() {
        if NO_VALUE.contains(&arg.as_str()) {
            continue;
        }
        if WITH_VALUE.contains(&arg.as_str()) {
            rest.next();
            continue;
        }
        if is_nvcc_option_with_inline_value(arg) {
            continue;
        }

        let Some((option, style, inline)) = rewrite(arg) else {
            expand_comma_list(&mut out, arg.clone());
            continue;
        };
        let value = match (style, inline) {
            (Value::None, _) => None,
            (_, Some(value)) => Some(value.to_string()),
            (_, None) => rest.next().cloned(),
        };
        match (style, value) {
            (Value::Separate, Some(value)) => {
                out.push(option.to_string());
                repeat_option(&mut out, option, &value);
            }
            (_, Some(value)) => expand_comma_list(&mut out, join(option, style, &value)),
            (_, None) => out.push(option.to_string()),
        }
    }
    out
}

/// `--name=value` for an NVCC-only option longer than two characters.
fn is_nvcc_option_with_inline_value(arg: &str) -> bool {
    arg.split_once('=')
        .is_some_and(|(name, _)| name.len() > 2 && WITH_VALUE.contains(&name))
}

/// Looks `arg` up exactly, or as `name=value`.
fn rewrite(arg: &str) -> Option<(&'static str, Value, Option<&str>)> {
    if let Some(&(option, style)) = REWRITES.get(arg) {
        return Some((option, style, None));
    }
    let (name, value) = arg.split_once('=')?;
    REWRITES
        .get(name)
        .map(|&(option, style)| (option, style, Some(value)))
}

fn join(option: &str, style: Value, value: &str) -> String {
    match style {
        Value::Equals => format!("{option}={value}"),
        _ => format!("{option}{value}"),
    }
}

/// Appends `token` to `out`, spelling out NVCC's comma lists.
///
/// `-opt=a,b` becomes `-opt a -opt b`. Macro definitions split only after
/// the `-D`, so `-DA=1,B` becomes `-D A=1 -D B`. A bare `a,b` repeats the
/// option emitted just before it.
fn expand_comma_list(out: &mut Vec<String>, token: String) {
    if !token.contains(',')
        || NATIVE_COMMA_PREFIXES
            .iter()
            .any(|prefix| token.starts_with(prefix))
    {
        out.push(token);
        return;
    }

    if token.starts_with('-') {
        let (option, list) = split_option(&token);
        for item in list.split(',') {
            out.push(option.to_string());
            out.push(item.to_string());
        }
        return;
    }

    match out.last().filter(|last| last.starts_with('-')).cloned() {
        Some(option) => repeat_option(out, &option, &token),
        None => out.push(token),
    }
}

/// Appends the items of `list`, each after its own copy of `option`.
///
/// The first item is expected to follow an `option` already in `out`.
fn repeat_option(out: &mut Vec<String>, option: &str, list: &str) {
    let mut items = list.split(',');
    if let Some(first) = items.next() {
        out.push(first.to_string());
    }
    for item in items {
        out.push(option.to_string());
        out.push(item.to_string());
    }
}

fn split_option(token: &str) -> (&str, &str) {
    if let Some(list) = token.strip_prefix("-D") {
        return ("-D", list);
    }
    match token.split_once('=') {
        Some((option, list)) => (option, list),
        None => token.split_at(token.char_indices().nth(2).map_or(token.len(), |(i, _)| i)),
    }
}
