//! `compdb extract`: action graph in, compilation database out.
//!
//! 1. Resolve the workspace root and load `compdb.toml`
//! 2. Read the action graph
//! 3. Normalize every action and find its headers
//! 4. Render diagnostics
//! 5. Write the database, unless it came out empty

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use compdb_common::CompileCommandEntry;
use compdb_config::CompdbConfig;
use compdb_diagnostics::{
    Diagnostic, DiagnosticCode, DiagnosticRenderer, DiagnosticSink, TerminalRenderer,
};
use compdb_extract::{read_action_graph, ExtractSettings, Extractor};
use compdb_toolchain::{SystemRunner, SystemToolchain};
use tracing::debug;

use crate::{ExtractArgs, GlobalArgs};

/// Name of the interceptor binary installed next to `compdb`.
const INTERCEPTOR_NAME: &str = "compdb-print-args";

/// Default database file name, at the workspace root.
const OUTPUT_FILE_NAME: &str = "compile_commands.json";

/// Set by `bazel run` to the workspace the command was started from.
const WORKSPACE_ENV: &str = "BUILD_WORKSPACE_DIRECTORY";

/// Runs the `compdb extract` command.
///
/// Returns exit code 0 once the database is written, 1 if there was
/// nothing to write.
pub fn run(args: &ExtractArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let workspace = resolve_workspace(args.workspace.as_deref())?;
    let config = load_config(&workspace, global)?;
    debug!(workspace = %workspace.display(), "resolved workspace");

    let exclude_external = config.extract.exclude_external_sources;
    let actions = if args.input == "-" {
        read_action_graph(io::stdin().lock(), exclude_external)?
    } else {
        read_action_graph(BufReader::new(File::open(&args.input)?), exclude_external)?
    };

    let mut settings = ExtractSettings::from_config(&config, default_interceptor());
    if let Some(jobs) = args.jobs {
        settings.jobs = jobs;
    }
    let extractor = Extractor::new(
        &workspace,
        settings,
        Box::new(SystemToolchain::new()),
        Box::new(SystemRunner::new()),
    );

    let sink = DiagnosticSink::new();
    sink.emit(Diagnostic::info(format!(
        "Analyzing {} compile actions in {}",
        actions.len(),
        workspace.display()
    )));
    let entries = extractor.compile_commands(actions, &sink)?;

    let output = args.output.as_deref();
    let code = if entries.is_empty() {
        sink.emit(no_commands(output));
        1
    } else {
        write_database(&entries, output, &workspace)?;
        sink.emit(Diagnostic::success(format!(
            "Finished writing {} entries to {}",
            entries.len(),
            output.unwrap_or(OUTPUT_FILE_NAME)
        )));
        0
    };

    render(&sink, global);
    Ok(code)
}

/// The workspace root as an absolute path.
fn resolve_workspace(flag: Option<&str>) -> io::Result<PathBuf> {
    let dir = match flag {
        Some(dir) => PathBuf::from(dir),
        None => match std::env::var_os(WORKSPACE_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => std::env::current_dir()?,
        },
    };
    std::path::absolute(dir)
}

fn load_config(workspace: &Path, global: &GlobalArgs) -> Result<CompdbConfig, compdb_config::ConfigError> {
    match &global.config {
        Some(path) => compdb_config::load_config_file(Path::new(path)),
        None => compdb_config::load_config(workspace),
    }
}

/// `compdb-print-args` beside the running executable.
fn default_interceptor() -> PathBuf {
    let name = format!("{INTERCEPTOR_NAME}{}", std::env::consts::EXE_SUFFIX);
    match std::env::current_exe() {
        Ok(exe) => exe.with_file_name(name),
        Err(_) => PathBuf::from(name),
    }
}

fn no_commands(output: Option<&str>) -> Diagnostic {
    let target = output.unwrap_or(OUTPUT_FILE_NAME);
    Diagnostic::warning(
        DiagnosticCode::NO_COMMANDS,
        format!("No compile commands found; {target} was left untouched."),
    )
    .with_note("Check that the query selects C-family compile actions (mnemonic CppCompile or ObjcCompile).")
    .with_note("Any errors above explain which actions were skipped.")
}

/// Writes `entries` as a pretty-printed JSON array.
///
/// Relative paths are taken relative to the workspace, like the default.
fn write_database(
    entries: &[CompileCommandEntry],
    output: Option<&str>,
    workspace: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(entries)?;
    match output {
        Some("-") => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{json}")?;
            stdout.flush()?;
        }
        Some(path) => std::fs::write(workspace.join(path), json + "\n")?,
        None => std::fs::write(workspace.join(OUTPUT_FILE_NAME), json + "\n")?,
    }
    Ok(())
}

/// Prints accumulated diagnostics to stderr. `--quiet` keeps only errors.
fn render(sink: &DiagnosticSink, global: &GlobalArgs) {
    let renderer = TerminalRenderer::new(global.color);
    let diagnostics: Vec<Diagnostic> = sink
        .take_all()
        .into_iter()
        .filter(|diag| !global.quiet || diag.severity.is_error())
        .collect();
    eprint!("{}", renderer.render_all(&diagnostics));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(file: &str) -> CompileCommandEntry {
        CompileCommandEntry {
            file: file.to_string(),
            arguments: vec!["cc".to_string(), "-c".to_string(), file.to_string()],
            directory: "/ws".to_string(),
        }
    }

    #[test]
    fn explicit_workspace_is_made_absolute() {
        let dir = resolve_workspace(Some("some/ws")).unwrap();
        assert!(dir.is_absolute());
        assert!(dir.ends_with("some/ws"));
    }

    #[test]
    fn database_defaults_to_workspace_root() {
        let dir = tempfile::tempdir().unwrap();
        write_database(&[entry("a.c"), entry("b.c")], None, dir.path()).unwrap();
        let written = std::fs::read_to_string(dir.path().join(OUTPUT_FILE_NAME)).unwrap();
        let parsed: Vec<CompileCommandEntry> = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, vec![entry("a.c"), entry("b.c")]);
        assert!(written.starts_with("[\n  {\n    \"file\": \"a.c\""));
    }

    #[test]
    fn relative_output_is_under_workspace() {
        let dir = tempfile::tempdir().unwrap();
        write_database(&[entry("a.c")], Some("out.json"), dir.path()).unwrap();
        assert!(dir.path().join("out.json").exists());
        assert!(!dir.path().join(OUTPUT_FILE_NAME).exists());
    }

    #[test]
    fn interceptor_sits_beside_the_executable() {
        let path = default_interceptor();
        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with(INTERCEPTOR_NAME));
    }

    #[test]
    fn config_flag_overrides_workspace_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("compdb.toml"), "[extract]\njobs = 2\n").unwrap();
        let custom = dir.path().join("custom.toml");
        std::fs::write(&custom, "[extract]\njobs = 7\n").unwrap();

        let mut global = GlobalArgs {
            quiet: false,
            verbose: false,
            color: false,
            config: None,
        };
        assert_eq!(load_config(dir.path(), &global).unwrap().extract.jobs, 2);
        global.config = Some(custom.display().to_string());
        assert_eq!(load_config(dir.path(), &global).unwrap().extract.jobs, 7);
    }

    #[test]
    fn empty_result_warning_names_output() {
        let diag = no_commands(Some("db.json"));
        assert_eq!(diag.code, Some(DiagnosticCode::NO_COMMANDS));
        assert!(diag.message.contains("db.json"));
    }
}
