//! Running compilers and host tools as child processes.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use tracing::debug;

use crate::error::ToolchainError;
use crate::quote::param_file_contents;

/// `ERROR_FILENAME_EXCED_RANGE`, raised by `CreateProcess` for long command lines.
const WINDOWS_COMMAND_TOO_LONG: i32 = 206;
/// `E2BIG` on Linux and macOS.
const UNIX_ARG_LIST_TOO_LONG: i32 = 7;

/// A command line to execute, with its environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program followed by its arguments.
    pub args: Vec<String>,
    /// Variables set for the child, on top of the inherited environment.
    pub env: BTreeMap<String, String>,
    /// Whether the child starts from this process's environment.
    pub inherit_env: bool,
    /// Working directory for the child.
    pub cwd: Option<PathBuf>,
    /// Whether stdout is captured. When `false` it is discarded.
    pub capture_stdout: bool,
}

impl Invocation {
    /// An invocation inheriting this process's environment and capturing both streams.
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            env: BTreeMap::new(),
            inherit_env: true,
            cwd: None,
            capture_stdout: true,
        }
    }

    /// Overlays `env` on the child's environment.
    pub fn envs(mut self, env: &BTreeMap<String, String>) -> Self {
        self.env
            .extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Sets one variable for the child.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Starts the child with only the variables set on this invocation.
    pub fn clear_env(mut self) -> Self {
        self.inherit_env = false;
        self
    }

    /// Runs the child in `dir`.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Sends stdout to the null device.
    pub fn discard_stdout(mut self) -> Self {
        self.capture_stdout = false;
        self
    }

    /// The command line joined with spaces, for messages.
    pub fn display(&self) -> String {
        self.args.join(" ")
    }
}

/// What a finished child process produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, or `None` if the child was killed by a signal.
    pub status: Option<i32>,
    /// Captured stdout, lossily decoded. Empty when discarded.
    pub stdout: String,
    /// Captured stderr, lossily decoded.
    pub stderr: String,
}

impl ProcessOutput {
    /// Returns `true` if the child exited with status 0.
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

impl From<Output> for ProcessOutput {
    fn from(output: Output) -> Self {
        Self {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Executes invocations to completion.
///
/// A non-zero exit status is not an error: callers inspect the output,
/// since compilers routinely fail on code under active edit.
pub trait ProcessRunner: Send + Sync {
    /// Runs `invocation` and waits for it to exit.
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, ToolchainError>;
}

/// Runs invocations with [`std::process::Command`].
///
/// Command lines the OS rejects as too long are retried once with the
/// arguments spilled to a temporary parameter file (`argv0 @file`). The file
/// is removed when the retry finishes, whatever its outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    /// Creates a runner.
    pub fn new() -> Self {
        Self
    }

    fn spawn(invocation: &Invocation, args: &[String]) -> std::io::Result<Output> {
        let mut cmd = Command::new(&args[0]);
        cmd.args(&args[1..]);
        if !invocation.inherit_env {
            cmd.env_clear();
        }
        cmd.envs(&invocation.env);
        if let Some(dir) = &invocation.cwd {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null())
            .stdout(if invocation.capture_stdout {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stderr(Stdio::piped());
        cmd.output()
    }

    fn run_with_param_file(invocation: &Invocation) -> Result<ProcessOutput, ToolchainError> {
        let mut file = tempfile::Builder::new()
            .prefix("compdb-")
            .suffix(".params")
            .tempfile()
            .map_err(ToolchainError::ParamFile)?;
        file.write_all(param_file_contents(&invocation.args[1..]).as_bytes())
            .map_err(ToolchainError::ParamFile)?;
        // Close our handle first; cl.exe refuses files another process holds open.
        let path = file.into_temp_path();

        let args = vec![
            invocation.args[0].clone(),
            format!("@{}", path.display()),
        ];
        debug!(program = %args[0], params = %path.display(), "command line too long; using parameter file");
        let output = Self::spawn(invocation, &args).map_err(|e| ToolchainError::Spawn {
            program: args[0].clone(),
            source: e,
        })?;
        Ok(output.into())
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, ToolchainError> {
        if invocation.args.is_empty() {
            return Err(ToolchainError::EmptyCommand);
        }
        debug!(command = %invocation.display(), "spawning");
        match Self::spawn(invocation, &invocation.args) {
            Ok(output) => Ok(output.into()),
            Err(e) if is_command_too_long(&e) => Self::run_with_param_file(invocation),
            Err(e) => Err(ToolchainError::Spawn {
                program: invocation.args[0].clone(),
                source: e,
            }),
        }
    }
}

fn is_command_too_long(err: &std::io::Error) -> bool {
    match err.raw_os_error() {
        Some(code) if cfg!(windows) => code == WINDOWS_COMMAND_TOO_LONG,
        Some(code) if cfg!(unix) => code == UNIX_ARG_LIST_TOO_LONG,
        _ => false,
    }
}
