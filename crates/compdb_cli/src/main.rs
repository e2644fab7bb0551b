//! compdb CLI: writes a `compile_commands.json` for a Bazel workspace.
//!
//! `compdb extract` reads the output of
//! `bazel aquery --output=jsonproto 'mnemonic("CppCompile", deps(//...))'`
//! and writes a compilation database that clangd and similar tools can use.

#![warn(missing_docs)]

mod extract;
mod logging;

use std::io::IsTerminal;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// compdb: compile commands for Bazel workspaces.
#[derive(Parser, Debug)]
#[command(name = "compdb", version, about = "Compilation database extractor for Bazel")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `compdb.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert an action graph into a compilation database.
    Extract(ExtractArgs),
}

/// Arguments for the `compdb extract` subcommand.
#[derive(Parser, Debug)]
pub struct ExtractArgs {
    /// Action graph JSON from `bazel aquery --output=jsonproto`; `-` reads stdin.
    #[arg(short, long, default_value = "-")]
    pub input: String,

    /// Where to write the database; `-` writes to stdout.
    /// Defaults to `compile_commands.json` in the workspace.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Workspace root. Defaults to `$BUILD_WORKSPACE_DIRECTORY`, then the current directory.
    #[arg(short, long)]
    pub workspace: Option<String>,

    /// Number of actions processed at once; overrides the config.
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Color when stderr is a terminal.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };
    logging::init_logging(&global);

    let result = match cli.command {
        Command::Extract(ref args) => extract::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_extract_default() {
        let cli = Cli::parse_from(["compdb", "extract"]);
        match cli.command {
            Command::Extract(ref args) => {
                assert_eq!(args.input, "-");
                assert!(args.output.is_none());
                assert!(args.workspace.is_none());
                assert!(args.jobs.is_none());
            }
        }
    }

    #[test]
    fn parse_extract_with_args() {
        let cli = Cli::parse_from([
            "compdb",
            "extract",
            "--input",
            "aquery.json",
            "--output",
            "-",
            "--workspace",
            "/ws",
            "--jobs",
            "8",
        ]);
        let Command::Extract(args) = cli.command;
        assert_eq!(args.input, "aquery.json");
        assert_eq!(args.output.as_deref(), Some("-"));
        assert_eq!(args.workspace.as_deref(), Some("/ws"));
        assert_eq!(args.jobs, Some(8));
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["compdb", "--quiet", "--color", "never", "extract"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["compdb", "extract", "-v", "--color", "always"]);
        assert!(cli.verbose);
        assert_eq!(cli.color, ColorChoice::Always);
    }

    #[test]
    fn parse_config_path() {
        let cli = Cli::parse_from(["compdb", "--config", "/path/to/compdb.toml", "extract"]);
        assert_eq!(cli.config.as_deref(), Some("/path/to/compdb.toml"));
    }

    #[test]
    fn rejects_bad_jobs() {
        assert!(Cli::try_parse_from(["compdb", "extract", "--jobs", "many"]).is_err());
    }
}
