//! Runs the per-action pipeline over a whole action list.

use std::path::{Path, PathBuf};

use compdb_cache::HeaderCache;
use compdb_common::{ActionResult, CompileAction, CompileCommandEntry, HeaderSet, MtimeCache, SourceSet};
use compdb_config::{CompdbConfig, HeaderExclusion};
use compdb_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, OnceKind};
use compdb_toolchain::{HostToolchain, ProcessRunner};
use rayon::prelude::*;
use tracing::debug;

use crate::emit::emit_entries;
use crate::error::ExtractError;
use crate::headers::{find_headers, HeaderContext};
use crate::patch::{self, EmscriptenSettings, PatchContext};
use crate::sources::{find_source, inject_language_flag, Language};

/// Upper bound on the default worker count.
const MAX_DEFAULT_JOBS: usize = 32;

/// Default worker count: `min(32, cpu_count + 4)`.
///
/// Workers mostly wait on compiler subprocesses, so a few more than there
/// are cores keeps the machine busy.
pub fn default_jobs() -> usize {
    let cpus = std::thread::available_parallelism().map_or(1, |n| n.get());
    MAX_DEFAULT_JOBS.min(cpus + 4)
}

/// Run-wide settings for an [`Extractor`].
#[derive(Debug, Clone)]
pub struct ExtractSettings {
    /// Which headers are left out.
    pub exclusion: HeaderExclusion,
    /// `INCLUDE` for `cl.exe` header discovery.
    pub msvc_include_paths: Vec<String>,
    /// How `emcc` actions are unwrapped.
    pub emscripten: EmscriptenSettings,
    /// Worker count; `0` selects [`default_jobs`].
    pub jobs: usize,
}

impl ExtractSettings {
    /// Settings from a loaded config.
    ///
    /// `interceptor` is used for `emcc` unless the config names one.
    pub fn from_config(config: &CompdbConfig, interceptor: PathBuf) -> Self {
        Self {
            exclusion: config.extract.exclude_headers,
            msvc_include_paths: config.msvc.default_include_paths.clone(),
            emscripten: EmscriptenSettings {
                interceptor: config.emscripten.interceptor.clone().unwrap_or(interceptor),
                config: config.emscripten.config.clone(),
            },
            jobs: config.extract.jobs,
        }
    }
}

/// What one action contributes to the compilation database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutput {
    /// Files the action compiles.
    pub sources: SourceSet,
    /// Headers those files include.
    pub headers: HeaderSet,
    /// The standalone compile command.
    pub arguments: Vec<String>,
}

/// Turns build-system compile actions into standalone compile commands.
///
/// Host services are injected so tests can substitute fakes. The mtime
/// memo lives as long as the extractor, so use a fresh one per run.
pub struct Extractor {
    root: PathBuf,
    settings: ExtractSettings,
    toolchain: Box<dyn HostToolchain>,
    runner: Box<dyn ProcessRunner>,
    mtimes: MtimeCache,
    cache: HeaderCache,
}

impl Extractor {
    /// Creates an extractor for the workspace at `root`, which should be absolute.
    pub fn new(
        root: impl Into<PathBuf>,
        settings: ExtractSettings,
        toolchain: Box<dyn HostToolchain>,
        runner: Box<dyn ProcessRunner>,
    ) -> Self {
        let root = root.into();
        Self {
            mtimes: MtimeCache::new(&root),
            cache: HeaderCache::new(&root),
            root,
            settings,
            toolchain,
            runner,
        }
    }

    /// The workspace root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn patch_context(&self) -> PatchContext<'_> {
        PatchContext {
            root: &self.root,
            toolchain: self.toolchain.as_ref(),
            runner: self.runner.as_ref(),
            emscripten: &self.settings.emscripten,
        }
    }

    fn header_context<'a>(&'a self, sink: &'a DiagnosticSink) -> HeaderContext<'a> {
        HeaderContext {
            root: &self.root,
            runner: self.runner.as_ref(),
            sink,
            cache: &self.cache,
            mtimes: &self.mtimes,
            exclusion: self.settings.exclusion,
            msvc_include_paths: &self.settings.msvc_include_paths,
        }
    }

    /// Normalizes one action and finds the files it applies to.
    pub fn process(&self, mut action: CompileAction, sink: &DiagnosticSink) -> ActionResult<ActionOutput> {
        let family = patch::despecialize(&mut action, self.patch_context())?;
        let source = find_source(&action.arguments)?;

        let headers = if !self.root.join(&source).exists() {
            sink.emit_once(OnceKind::MissingSource, || {
                Diagnostic::warning(
                    DiagnosticCode::MISSING_SOURCE,
                    format!("Source file {source} not found (probably generated and not yet built)."),
                )
                .with_note("Continuing gracefully, but this file won't have its headers listed.")
                .with_note("Build the generated files first to fix this and any similar warnings.")
            });
            HeaderSet::new()
        } else if Language::of(&source).is_some_and(|language| !language.has_headers()) {
            HeaderSet::new()
        } else {
            find_headers(&action, &source, family, &self.header_context(sink))?
        };

        let mut arguments = action.arguments;
        inject_language_flag(&mut arguments, &source, &headers, family);
        debug!(%source, headers = headers.len(), ?family, "processed action");
        Ok(ActionOutput {
            sources: SourceSet::from([source]),
            headers,
            arguments: patch::finish(family, arguments),
        })
    }

    /// Processes every action in parallel, keeping input order.
    ///
    /// An action that can't be normalized is reported as E001 and left out;
    /// the rest still go through.
    pub fn extract(
        &self,
        actions: Vec<CompileAction>,
        sink: &DiagnosticSink,
    ) -> Result<Vec<ActionOutput>, ExtractError> {
        let jobs = match self.settings.jobs {
            0 => default_jobs(),
            n => n,
        };
        debug!(actions = actions.len(), jobs, "extracting compile commands");
        let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;

        let outputs: Vec<Option<ActionOutput>> = pool.install(|| {
            actions
                .into_par_iter()
                .map(|action| {
                    let compiler = action.compiler().to_string();
                    let target = action.target_id.clone();
                    match self.process(action, sink) {
                        Ok(output) => Some(output),
                        Err(err) => {
                            sink.emit(
                                Diagnostic::error(
                                    DiagnosticCode::ACTION_SKIPPED,
                                    format!("Skipped a {compiler} action that couldn't be normalized."),
                                )
                                .with_note(format!("target id: {target}"))
                                .with_detail(err.message),
                            );
                            None
                        }
                    }
                })
                .collect()
        });
        Ok(outputs.into_iter().flatten().collect())
    }

    /// [`extract`](Self::extract) followed by [`emit_entries`].
    pub fn compile_commands(
        &self,
        actions: Vec<CompileAction>,
        sink: &DiagnosticSink,
    ) -> Result<Vec<CompileCommandEntry>, ExtractError> {
        let outputs = self.extract(actions, sink)?;
        Ok(emit_entries(outputs, &self.root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{strings, FakeRunner, FakeToolchain};
    use compdb_toolchain::ProcessOutput;

    fn settings(jobs: usize) -> ExtractSettings {
        ExtractSettings {
            exclusion: HeaderExclusion::None,
            msvc_include_paths: Vec::new(),
            emscripten: EmscriptenSettings {
                interceptor: PathBuf::from("compdb-print-args"),
                config: "emscripten_config".to_string(),
            },
            jobs,
        }
    }

    fn workspace(files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for file in files {
            let path = dir.path().join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, "").unwrap();
        }
        dir
    }

    /// Answers dependency queries with `<source>.h` as the only header.
    fn deps_runner() -> FakeRunner {
        FakeRunner::new(|invocation| {
            let source = invocation
                .args
                .iter()
                .find(|arg| arg.ends_with(".cc") || arg.ends_with(".c"))
                .cloned()
                .unwrap_or_default();
            let stem = source.rsplit_once('.').map_or(source.as_str(), |(stem, _)| stem);
            ProcessOutput {
                status: Some(0),
                stdout: format!("out.o: {source} {stem}.h\n"),
                stderr: String::new(),
            }
        })
    }

    #[test]
    fn default_jobs_is_bounded() {
        let jobs = default_jobs();
        assert!((5..=MAX_DEFAULT_JOBS).contains(&jobs));
    }

    #[test]
    fn settings_follow_config() {
        let config = compdb_config::load_config_from_str(
            "[extract]\nexclude_headers = \"all\"\njobs = 3\n[msvc]\ndefault_include_paths = \"C:/inc\"\n",
        )
        .unwrap();
        let settings = ExtractSettings::from_config(&config, PathBuf::from("/bin/compdb-print-args"));
        assert_eq!(settings.exclusion, HeaderExclusion::All);
        assert_eq!(settings.jobs, 3);
        assert_eq!(settings.msvc_include_paths, strings(&["C:/inc"]));
        assert_eq!(settings.emscripten.interceptor, PathBuf::from("/bin/compdb-print-args"));
    }

    #[test]
    fn processes_a_plain_action() {
        let dir = workspace(&["a.cc", "a.h"]);
        let extractor = Extractor::new(
            dir.path(),
            settings(1),
            Box::new(FakeToolchain::default()),
            Box::new(deps_runner()),
        );
        let sink = DiagnosticSink::new();
        let output = extractor
            .process(CompileAction::new(["clang", "-c", "a.cc", "-o", "out.o"]), &sink)
            .unwrap();
        assert_eq!(output.sources, SourceSet::from(["a.cc".to_string()]));
        assert_eq!(output.headers, HeaderSet::from(["a.h".to_string()]));
        // A .h header under a C++ source pins the language.
        assert_eq!(output.arguments, strings(&["clang", "-xc++", "-c", "a.cc", "-o", "out.o"]));
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn assembly_skips_header_discovery() {
        let dir = workspace(&["start.s"]);
        let runner = FakeRunner::fixed(0, "", "");
        let extractor = Extractor::new(dir.path(), settings(1), Box::new(FakeToolchain::default()), Box::new(runner));
        let sink = DiagnosticSink::new();
        let output = extractor
            .process(CompileAction::new(["clang", "-c", "start.s", "-o", "start.o"]), &sink)
            .unwrap();
        assert!(output.headers.is_empty());
    }

    #[test]
    fn unprocessable_actions_are_skipped_with_an_error() {
        let dir = workspace(&["a.cc", "b.cc"]);
        let extractor = Extractor::new(
            dir.path(),
            settings(2),
            Box::new(FakeToolchain::default()),
            Box::new(deps_runner()),
        );
        let sink = DiagnosticSink::new();
        let outputs = extractor
            .extract(
                vec![
                    CompileAction::new(["clang", "-c", "a.cc", "-o", "a.o"]),
                    CompileAction::new(["clang", "-c", "-o", "nothing.o"]),
                    CompileAction::new(["clang", "-c", "b.cc", "-o", "b.o"]),
                ],
                &sink,
            )
            .unwrap();
        let sources: Vec<_> = outputs.iter().flat_map(|o| o.sources.iter().cloned()).collect();
        assert_eq!(sources, strings(&["a.cc", "b.cc"]));
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.diagnostics()[0].code, Some(DiagnosticCode::ACTION_SKIPPED));
    }

    #[test]
    fn order_follows_input_not_completion() {
        let files: Vec<String> = (0..40).map(|i| format!("f{i}.cc")).collect();
        let refs: Vec<&str> = files.iter().map(String::as_str).collect();
        let dir = workspace(&refs);
        let extractor = Extractor::new(
            dir.path(),
            settings(8),
            Box::new(FakeToolchain::default()),
            Box::new(deps_runner()),
        );
        let actions = files
            .iter()
            .enumerate()
            .map(|(i, file)| CompileAction::new(["clang".to_string(), "-c".to_string(), file.clone(), "-o".to_string(), format!("f{i}.o")]))
            .collect();
        let outputs = extractor.extract(actions, &DiagnosticSink::new()).unwrap();
        let sources: Vec<String> = outputs.into_iter().flat_map(|o| o.sources).collect();
        assert_eq!(sources, files);
    }
}
