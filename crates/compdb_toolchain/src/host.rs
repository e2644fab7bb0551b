//! Memoized queries about the host's compilers and SDKs.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use tracing::debug;

use crate::error::ToolchainError;
use crate::runner::{Invocation, ProcessRunner, SystemRunner};

/// Host lookups the patch pipeline needs but does not own.
///
/// Answers are pure functions of stable host state, so implementations may
/// cache them for the life of the process.
pub trait HostToolchain: Send + Sync {
    /// Unversioned SDK root for an Apple platform name such as `MacOSX` or `iPhoneOS`.
    fn apple_sdk_root(&self, platform: &str) -> Result<String, ToolchainError>;

    /// The selected Xcode developer directory.
    fn apple_developer_dir(&self) -> Result<String, ToolchainError>;

    /// Path of the active Xcode `clang`.
    fn apple_active_compiler(&self) -> Result<String, ToolchainError>;

    /// If `compiler` is a symlink to `ccache`, the real compiler of the same name on `PATH`.
    ///
    /// Relative paths are resolved against `root`.
    fn real_compiler(&self, compiler: &str, root: &Path) -> Option<String>;
}

/// Answers [`HostToolchain`] queries by running `xcrun`/`xcode-select` and walking `PATH`.
pub struct SystemToolchain<R = SystemRunner> {
    runner: R,
    search_path: Option<OsString>,
    developer_dir: OnceLock<String>,
    active_compiler: OnceLock<String>,
    sdk_roots: Mutex<HashMap<String, String>>,
    real_compilers: Mutex<HashMap<String, Option<String>>>,
}

impl SystemToolchain<SystemRunner> {
    /// A toolchain backed by real processes and this process's `PATH`.
    pub fn new() -> Self {
        Self::with_runner(SystemRunner::new())
    }
}

impl Default for SystemToolchain<SystemRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ProcessRunner> SystemToolchain<R> {
    /// A toolchain that runs its queries through `runner`.
    pub fn with_runner(runner: R) -> Self {
        Self {
            runner,
            search_path: std::env::var_os("PATH"),
            developer_dir: OnceLock::new(),
            active_compiler: OnceLock::new(),
            sdk_roots: Mutex::new(HashMap::new()),
            real_compilers: Mutex::new(HashMap::new()),
        }
    }

    /// Overrides the `PATH` used to find real compilers behind `ccache`.
    pub fn with_search_path(mut self, path: impl Into<OsString>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    fn query(&self, args: &[&str]) -> Result<String, ToolchainError> {
        let invocation = Invocation::new(args.iter().copied());
        let output = self.runner.run(&invocation)?;
        if !output.success() {
            return Err(ToolchainError::Lookup {
                query: invocation.display(),
                reason: match output.status {
                    Some(code) => format!("exit status {code}"),
                    None => "terminated by signal".to_string(),
                },
            });
        }
        let answer = output.stdout.trim_end().to_string();
        if answer.is_empty() {
            return Err(ToolchainError::Lookup {
                query: invocation.display(),
                reason: "empty output".to_string(),
            });
        }
        Ok(answer)
    }

    fn memoized(
        &self,
        cell: &OnceLock<String>,
        compute: impl FnOnce() -> Result<String, ToolchainError>,
    ) -> Result<String, ToolchainError> {
        if let Some(value) = cell.get() {
            return Ok(value.clone());
        }
        let value = compute()?;
        Ok(cell.get_or_init(|| value).clone())
    }

    fn find_on_path(&self, name: &str) -> Option<PathBuf> {
        let search_path = self.search_path.as_ref()?;
        std::env::split_paths(search_path)
            .map(|dir| dir.join(name))
            .filter(|candidate| is_executable(candidate))
            .find(|candidate| !points_to_ccache(candidate))
    }
}

impl<R: ProcessRunner> HostToolchain for SystemToolchain<R> {
    fn apple_sdk_root(&self, platform: &str) -> Result<String, ToolchainError> {
        let sdk = platform.to_lowercase();
        if let Some(root) = lock(&self.sdk_roots).get(&sdk) {
            return Ok(root.clone());
        }
        let versioned = self.query(&["xcrun", "--show-sdk-path", "-sdk", &sdk])?;
        let version = self.query(&["xcrun", "--show-sdk-version", "-sdk", &sdk])?;
        // e.g. .../SDKs/iPhoneOS17.2.sdk -> .../SDKs/iPhoneOS.sdk, which survives SDK updates.
        let root = versioned.replace(&version, "");
        debug!(%sdk, %root, "resolved Apple SDK root");
        lock(&self.sdk_roots).insert(sdk, root.clone());
        Ok(root)
    }

    fn apple_developer_dir(&self) -> Result<String, ToolchainError> {
        self.memoized(&self.developer_dir, || {
            self.query(&["xcode-select", "--print-path"])
        })
    }

    fn apple_active_compiler(&self) -> Result<String, ToolchainError> {
        self.memoized(&self.active_compiler, || self.query(&["xcrun", "--find", "clang"]))
    }

    fn real_compiler(&self, compiler: &str, root: &Path) -> Option<String> {
        if let Some(known) = lock(&self.real_compilers).get(compiler) {
            return known.clone();
        }
        let path = root.join(compiler);
        let resolved = if is_symlink(&path) && points_to_ccache(&path) {
            path.file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| self.find_on_path(name))
                .map(|real| real.to_string_lossy().into_owned())
        } else {
            None
        };
        if let Some(real) = &resolved {
            debug!(compiler, %real, "resolved ccache shim");
        }
        lock(&self.real_compilers).insert(compiler.to_string(), resolved.clone());
        resolved
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn is_symlink(path: &Path) -> bool {
    std::fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

fn points_to_ccache(path: &Path) -> bool {
    std::fs::canonicalize(path)
        .ok()
        .and_then(|target| target.file_stem().map(|stem| stem == "ccache"))
        .unwrap_or(false)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
