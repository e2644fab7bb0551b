//! Header discovery through GCC-style dependency output.

use compdb_cache::Resolution;
use compdb_common::{ActionResult, CompileAction, HeaderSet};
use compdb_toolchain::Invocation;
use tracing::debug;

use super::makefile::parse_dependencies;
use super::{is_output_flag, report_compiler_output, HeaderContext};
use crate::family::CompilerFamily;

/// Turns a compile command into one that prints its dependencies.
///
/// Existing dependency-file flags are stripped because Apple clang won't let
/// later flags override earlier ones. The output is stripped so Apple clang
/// doesn't do a full compile, and sanitizer ignore lists are stripped so they
/// don't show up as dependencies.
pub fn discovery_command(args: &[String], family: CompilerFamily) -> Vec<String> {
    let mut command = Vec::with_capacity(args.len() + 2);
    let mut iter = args.iter();
    if let Some(program) = iter.next() {
        command.push(program.clone());
    }
    while let Some(arg) = iter.next() {
        if arg == "-o" || arg == "--output" {
            iter.next();
            continue;
        }
        if arg.starts_with("-M")
            || arg.ends_with("-dependencies")
            || arg.ends_with(".d")
            || is_output_flag(arg)
            || arg.starts_with("-fsanitize")
        {
            continue;
        }
        command.push(arg.clone());
    }
    command.extend(family.dependency_flags().iter().map(|flag| flag.to_string()));
    command
}

/// Runs the preprocessor and parses the headers it reports.
///
/// Compiler errors are never fatal: code under edit often doesn't build,
/// yet the dependency list usually comes out anyway. Headers the compiler
/// reports as missing are dropped, and the result is then partial.
pub fn resolve(
    action: &CompileAction,
    source: &str,
    family: CompilerFamily,
    ctx: &HeaderContext<'_>,
) -> ActionResult<Resolution> {
    let invocation = Invocation::new(discovery_command(&action.arguments, family))
        .envs(&action.environment_variables)
        .current_dir(ctx.root);
    let output = ctx.runner.run(&invocation)?;

    if !output.stderr.is_empty() {
        report_compiler_output(ctx.sink, source, output.stderr);
    }
    if output.stdout.trim().is_empty() {
        return Ok(Resolution::complete(HeaderSet::new()));
    }

    let reported = parse_dependencies(&output.stdout, Some(source), cfg!(windows))?;
    let total = reported.len();
    let headers: HeaderSet = reported
        .into_iter()
        .filter(|header| ctx.root.join(header).exists())
        .collect();
    if headers.len() < total {
        debug!(source, missing = total - headers.len(), "dropped headers that don't exist yet");
        return Ok(Resolution::partial(headers));
    }
    Ok(Resolution::complete(headers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::tests::Fixture;
    use crate::testing::{strings, FakeRunner};

    fn gcc_action() -> CompileAction {
        CompileAction::new(["gcc", "-c", "a.c"])
    }

    #[test]
    fn strips_dependency_output_and_sanitizer_flags() {
        let args = strings(&[
            "clang",
            "-MD",
            "-MF",
            "bazel-out/a.d",
            "-fsanitize-ignorelist=ignore.txt",
            "-fsanitize=address",
            "--write-dependencies",
            "-c",
            "a.cc",
            "-o",
            "bazel-out/a.o",
            "--output=x.o",
            "-Fox.obj",
        ]);
        assert_eq!(
            discovery_command(&args, CompilerFamily::Gcc),
            strings(&[
                "clang",
                "-c",
                "a.cc",
                "--dependencies",
                "--print-missing-file-dependencies",
            ])
        );
    }

    #[test]
    fn nvcc_uses_its_own_flag() {
        let args = strings(&["nvcc", "-c", "k.cu", "-o", "k.o"]);
        assert_eq!(
            discovery_command(&args, CompilerFamily::Nvcc),
            strings(&["nvcc", "-c", "k.cu", "-M"])
        );
    }

    #[test]
    fn existing_headers_are_complete() {
        let fixture = Fixture::with_files(&["a.c", "inc/a.h", "inc/b.h"]);
        let runner = FakeRunner::fixed(0, "a.o: a.c inc/a.h \\\n inc/b.h\n", "");
        let ctx = fixture.context(&runner);
        let resolution = resolve(
            &CompileAction::new(["gcc", "-c", "a.c", "-o", "a.o"]).with_env("LANG", "C"),
            "a.c",
            CompilerFamily::Gcc,
            &ctx,
        )
        .unwrap();
        assert!(resolution.cacheable);
        assert_eq!(resolution.headers.len(), 2);

        let call = runner.last_call();
        assert_eq!(call.cwd.as_deref(), Some(fixture.root()));
        assert!(call.args.contains(&"--print-missing-file-dependencies".to_string()));
        assert_eq!(call.env["LANG"], "C");
        assert!(call.inherit_env);
    }

    #[test]
    fn missing_headers_make_result_partial() {
        let fixture = Fixture::with_files(&["a.c", "inc/a.h"]);
        let runner = FakeRunner::fixed(0, "a.o: a.c inc/a.h gen/not_yet.h\n", "");
        let ctx = fixture.context(&runner);
        let resolution = resolve(&gcc_action(), "a.c", CompilerFamily::Gcc, &ctx).unwrap();
        assert!(!resolution.cacheable);
        assert_eq!(resolution.headers, HeaderSet::from(["inc/a.h".to_string()]));
    }

    #[test]
    fn compiler_errors_are_advisory() {
        let fixture = Fixture::with_files(&["a.c", "a.h"]);
        let runner = FakeRunner::fixed(1, "a.o: a.c a.h\n", "a.c:3: error: expected ';'\n");
        let ctx = fixture.context(&runner);
        let resolution = resolve(&gcc_action(), "a.c", CompilerFamily::Gcc, &ctx).unwrap();
        assert_eq!(resolution.headers.len(), 1);

        let diags = fixture.sink.diagnostics();
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[1].detail.as_deref(), Some("a.c:3: error: expected ';'\n"));
    }

    #[test]
    fn no_output_is_empty() {
        let fixture = Fixture::with_files(&["a.c"]);
        let runner = FakeRunner::fixed(1, "", "fatal error\n");
        let ctx = fixture.context(&runner);
        let resolution = resolve(&gcc_action(), "a.c", CompilerFamily::Gcc, &ctx).unwrap();
        assert!(resolution.headers.is_empty());
    }
}
