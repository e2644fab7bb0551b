//! Classification of a compile action by its compiler's argument dialect.

/// The argument dialect a compiler invocation is written in.
///
/// Chosen once per action from `argv[0]`. Anything not recognised is treated
/// as GCC-compatible, which covers clang as well.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompilerFamily {
    /// GCC, clang, and anything else that accepts their flags.
    Gcc,
    /// `cl.exe` and `clang-cl.exe`.
    Msvc,
    /// NVIDIA's CUDA driver.
    Nvcc,
    /// Emscripten's `emcc` wrapper around clang.
    Emscripten,
}

impl CompilerFamily {
    /// Classifies an argument vector by its program name.
    pub fn classify<S: AsRef<str>>(args: &[S]) -> Self {
        let Some(program) = args.first().map(AsRef::as_ref) else {
            return CompilerFamily::Gcc;
        };
        let name = basename(program);
        if program.ends_with("cl.exe") {
            CompilerFamily::Msvc
        } else if name.starts_with("nvcc") {
            CompilerFamily::Nvcc
        } else if name.starts_with("emcc") {
            CompilerFamily::Emscripten
        } else {
            CompilerFamily::Gcc
        }
    }

    /// Returns `true` if headers are found through `/showIncludes`.
    pub fn is_msvc(self) -> bool {
        self == CompilerFamily::Msvc
    }

    /// Flags that make this compiler print makefile-format dependencies to stdout.
    ///
    /// GCC and clang also list headers that don't exist yet instead of failing.
    pub fn dependency_flags(self) -> &'static [&'static str] {
        match self {
            CompilerFamily::Nvcc => &["-M"],
            _ => &["--dependencies", "--print-missing-file-dependencies"],
        }
    }
}

/// The final path component, splitting on either separator.
pub fn basename(path: &str) -> &str {
    path.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(path)
}
