//! Fakes for the host seams, shared by unit tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use compdb_toolchain::{HostToolchain, Invocation, ProcessOutput, ProcessRunner, ToolchainError};

pub const SDK_ROOT: &str = "/Library/Developer/CommandLineTools/SDKs/MacOSX.sdk";
pub const DEVELOPER_DIR: &str = "/Library/Developer/CommandLineTools";
pub const ACTIVE_CLANG: &str = "/Library/Developer/CommandLineTools/usr/bin/clang";

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Canned answers for Apple lookups and `ccache` resolution.
#[derive(Default)]
pub struct FakeToolchain {
    ccache: HashMap<String, String>,
    broken: bool,
}

impl FakeToolchain {
    pub fn with_ccache(mut self, shim: &str, real: &str) -> Self {
        self.ccache.insert(shim.to_string(), real.to_string());
        self
    }

    /// Every Apple lookup fails, as on a host without Xcode.
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    fn answer(&self, value: &str) -> Result<String, ToolchainError> {
        if self.broken {
            return Err(ToolchainError::Lookup {
                query: "xcrun".to_string(),
                reason: "not installed".to_string(),
            });
        }
        Ok(value.to_string())
    }
}

impl HostToolchain for FakeToolchain {
    fn apple_sdk_root(&self, _platform: &str) -> Result<String, ToolchainError> {
        self.answer(SDK_ROOT)
    }

    fn apple_developer_dir(&self) -> Result<String, ToolchainError> {
        self.answer(DEVELOPER_DIR)
    }

    fn apple_active_compiler(&self) -> Result<String, ToolchainError> {
        self.answer(ACTIVE_CLANG)
    }

    fn real_compiler(&self, compiler: &str, _root: &Path) -> Option<String> {
        self.ccache.get(compiler).cloned()
    }
}

type Responder = Box<dyn Fn(&Invocation) -> ProcessOutput + Send + Sync>;

/// Records every invocation and answers it with a closure.
pub struct FakeRunner {
    respond: Responder,
    pub calls: Mutex<Vec<Invocation>>,
}

impl FakeRunner {
    pub fn new(respond: impl Fn(&Invocation) -> ProcessOutput + Send + Sync + 'static) -> Self {
        Self {
            respond: Box::new(respond),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always prints `stdout`/`stderr` and exits with `status`.
    pub fn fixed(status: i32, stdout: &str, stderr: &str) -> Self {
        let (stdout, stderr) = (stdout.to_string(), stderr.to_string());
        Self::new(move |_| ProcessOutput {
            status: Some(status),
            stdout: stdout.clone(),
            stderr: stderr.clone(),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> Invocation {
        self.calls.lock().unwrap().last().cloned().unwrap()
    }
}

impl ProcessRunner for FakeRunner {
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, ToolchainError> {
        self.calls.lock().unwrap().push(invocation.clone());
        Ok((self.respond)(invocation))
    }
}
