//! Shared fixtures for pipeline integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use compdb_config::HeaderExclusion;
use compdb_extract::{EmscriptenSettings, ExtractSettings, Extractor};
use compdb_toolchain::{HostToolchain, Invocation, ProcessOutput, ProcessRunner, ToolchainError};
use tempfile::TempDir;

pub const SDK_ROOT: &str = "/Applications/Xcode.app/Contents/Developer/Platforms/MacOSX.platform/Developer/SDKs/MacOSX.sdk";
pub const DEVELOPER_DIR: &str = "/Applications/Xcode.app/Contents/Developer";
pub const ACTIVE_CLANG: &str = "/Applications/Xcode.app/Contents/Developer/Toolchains/XcodeDefault.xctoolchain/usr/bin/clang";

// ---------------------------------------------------------------------------
// Host fakes
// ---------------------------------------------------------------------------

/// A Mac with Xcode installed and no `ccache`.
pub struct FakeXcode;

impl HostToolchain for FakeXcode {
    fn apple_sdk_root(&self, platform: &str) -> Result<String, ToolchainError> {
        assert_eq!(platform, "MacOSX");
        Ok(SDK_ROOT.to_string())
    }

    fn apple_developer_dir(&self) -> Result<String, ToolchainError> {
        Ok(DEVELOPER_DIR.to_string())
    }

    fn apple_active_compiler(&self) -> Result<String, ToolchainError> {
        Ok(ACTIVE_CLANG.to_string())
    }

    fn real_compiler(&self, _compiler: &str, _root: &Path) -> Option<String> {
        None
    }
}

/// A compiler whose dependency output comes from a table keyed by source file.
///
/// Clones share the call log, so a clone kept by the test sees the calls
/// made through the one handed to the extractor.
#[derive(Clone, Default)]
pub struct FakeCompiler {
    includes: Arc<HashMap<String, Vec<String>>>,
    calls: Arc<Mutex<Vec<Invocation>>>,
}

impl FakeCompiler {
    pub fn new(includes: &[(&str, &[&str])]) -> Self {
        Self {
            includes: Arc::new(
                includes
                    .iter()
                    .map(|(source, headers)| {
                        (source.to_string(), headers.iter().map(|h| h.to_string()).collect())
                    })
                    .collect(),
            ),
            calls: Arc::default(),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProcessRunner for FakeCompiler {
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, ToolchainError> {
        self.calls.lock().unwrap().push(invocation.clone());
        let source = invocation
            .args
            .iter()
            .find(|arg| self.includes.contains_key(arg.as_str()))
            .cloned();
        let stdout = match source {
            Some(source) => format!("out.o: {source} {}\n", self.includes[&source].join(" ")),
            None => String::new(),
        };
        Ok(ProcessOutput {
            status: Some(0),
            stdout,
            stderr: String::new(),
        })
    }
}

// ---------------------------------------------------------------------------
// Workspace
// ---------------------------------------------------------------------------

/// A temporary workspace with empty files at the given relative paths.
pub fn workspace(files: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for file in files {
        let path = dir.path().join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "").unwrap();
    }
    dir
}

pub fn settings() -> ExtractSettings {
    ExtractSettings {
        exclusion: HeaderExclusion::None,
        msvc_include_paths: Vec::new(),
        emscripten: EmscriptenSettings {
            interceptor: PathBuf::from("compdb-print-args"),
            config: "emscripten_config".to_string(),
        },
        jobs: 4,
    }
}

/// An extractor over `root` answering queries with `compiler` and a fake Xcode.
pub fn extractor(root: &Path, compiler: &FakeCompiler) -> Extractor {
    Extractor::new(root, settings(), Box::new(FakeXcode), Box::new(compiler.clone()))
}
