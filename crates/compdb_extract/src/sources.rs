//! Locating the source file of a compile command and its language.

use std::path::Path;

use compdb_common::{ActionError, ActionResult, HeaderSet};

use crate::family::CompilerFamily;

/// Source languages of the C family, by file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Language {
    /// C, including preprocessed `.i`.
    C,
    /// C++, including preprocessed `.ii`.
    Cpp,
    /// Objective-C.
    ObjC,
    /// Objective-C++.
    ObjCpp,
    /// CUDA.
    Cuda,
    /// OpenCL C.
    OpenCl,
    /// C++ for OpenCL.
    OpenClCpp,
    /// Assembly that is not preprocessed, and so cannot `#include`.
    Assembly,
    /// Assembly run through the C preprocessor.
    AssemblyWithCpp,
}

impl Language {
    /// The language of a source path, if it has a known extension.
    ///
    /// Extensions are case-sensitive: `.C` is C++, `.c` is C.
    pub fn of(path: &str) -> Option<Self> {
        let extension = Path::new(path).extension()?.to_str()?;
        Some(match extension {
            "c" | "i" => Language::C,
            "cc" | "cpp" | "cxx" | "c++" | "C" | "CC" | "cp" | "CPP" | "C++" | "CXX" | "ii" => {
                Language::Cpp
            }
            "m" => Language::ObjC,
            "mm" | "M" => Language::ObjCpp,
            "cu" | "cui" => Language::Cuda,
            "cl" => Language::OpenCl,
            "clcpp" => Language::OpenClCpp,
            "s" | "asm" => Language::Assembly,
            "S" => Language::AssemblyWithCpp,
            _ => return None,
        })
    }

    /// The clang `-x` flag naming this language.
    pub fn flag(self) -> &'static str {
        match self {
            Language::C => "-xc",
            Language::Cpp => "-xc++",
            Language::ObjC => "-xobjective-c",
            Language::ObjCpp => "-xobjective-c++",
            Language::Cuda => "-xcuda",
            Language::OpenCl => "-xcl",
            Language::OpenClCpp => "-xclcpp",
            Language::Assembly => "-xassembler",
            Language::AssemblyWithCpp => "-xassembler-with-cpp",
        }
    }

    /// Returns `false` for sources that cannot include headers.
    pub fn has_headers(self) -> bool {
        self != Language::Assembly
    }
}

fn is_source(arg: &str) -> bool {
    !arg.starts_with('-') && Language::of(arg).is_some()
}

/// Finds the one source file `args` compiles.
///
/// Include directories sometimes carry source extensions too. When there is
/// more than one candidate, Bazel's layout decides: the source comes right
/// before `-o` in GCC-style commands and right after `/c` in MSVC-style ones.
/// A command that fits neither layout is rejected rather than guessed at.
pub fn find_source(args: &[String]) -> ActionResult<String> {
    let candidates: Vec<&String> = args.iter().skip(1).filter(|arg| is_source(arg)).collect();
    match candidates.as_slice() {
        [] => Err(ActionError::new(format!(
            "No source files found in compile args: {args:?}"
        ))),
        [only] => Ok((*only).clone()),
        _ => {
            let index = if let Some(o) = args.iter().position(|arg| arg == "-o") {
                o.checked_sub(1)
            } else if let Some(c) = args.iter().position(|arg| arg == "/c") {
                Some(c + 1)
            } else {
                return Err(ActionError::new(format!(
                    "-o or /c, required for parsing sources in GCC or MSVC-formatted commands, respectively, not found in compile args: {args:?}"
                )));
            };
            match index.and_then(|i| args.get(i)) {
                Some(source) if is_source(source) => Ok(source.clone()),
                Some(source) => Err(ActionError::new(format!(
                    "Source file candidate, {source}, seems to be wrong.\nSelected from {args:?}"
                ))),
                None => Err(ActionError::new(format!(
                    "No argument at the expected source position in {args:?}"
                ))),
            }
        }
    }
}

/// Returns `true` if the command already says what language it compiles.
fn has_language_flag(args: &[String]) -> bool {
    args.iter().any(|arg| {
        arg.starts_with("-x")
            || arg.starts_with("--language")
            || matches!(arg.to_lowercase().as_str(), "-objc" | "-objc++" | "/tc" | "/tp")
    })
}

/// Pins the language of `.h` headers that are compiled as something other than C.
///
/// Tools otherwise assume a `.h` file is C. The flag goes right after the
/// compiler because a language flag only applies to the files after it.
pub fn inject_language_flag(
    args: &mut Vec<String>,
    source: &str,
    headers: &HeaderSet,
    family: CompilerFamily,
) {
    let language = Language::of(source);
    if args.is_empty()
        || !headers.iter().any(|header| header.ends_with(".h"))
        || language == Some(Language::C)
        || has_language_flag(args)
    {
        return;
    }
    let flag = if family.is_msvc() {
        "/TP"
    } else {
        match language {
            Some(language) => language.flag(),
            None => return,
        }
    };
    args.insert(1, flag.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::strings;

    fn headers(items: &[&str]) -> HeaderSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn extensions_are_case_sensitive() {
        assert_eq!(Language::of("a.c"), Some(Language::C));
        assert_eq!(Language::of("a.C"), Some(Language::Cpp));
        assert_eq!(Language::of("a.M"), Some(Language::ObjCpp));
        assert_eq!(Language::of("a.S"), Some(Language::AssemblyWithCpp));
        assert_eq!(Language::of("a.s"), Some(Language::Assembly));
        assert_eq!(Language::of("lib.c++"), Some(Language::Cpp));
        assert_eq!(Language::of("a.h"), None);
        assert_eq!(Language::of("noext"), None);
    }

    #[test]
    fn only_assembly_lacks_headers() {
        assert!(!Language::Assembly.has_headers());
        assert!(Language::AssemblyWithCpp.has_headers());
        assert!(Language::Cuda.has_headers());
    }

    #[test]
    fn single_candidate() {
        assert_eq!(find_source(&strings(&["gcc", "foo.c", "-o", "foo.o"])).unwrap(), "foo.c");
    }

    #[test]
    fn flags_and_compiler_are_not_candidates() {
        assert_eq!(
            find_source(&strings(&["/usr/bin/tool.cc", "-Iinclude.cc", "x.cpp"])).unwrap(),
            "x.cpp"
        );
    }

    #[test]
    fn disambiguates_before_dash_o() {
        let args = strings(&["gcc", "-iquote", "third_party/lib.cc", "-c", "src/a.cc", "-o", "a.o"]);
        assert_eq!(find_source(&args).unwrap(), "src/a.cc");
    }

    #[test]
    fn disambiguates_after_slash_c() {
        let args = strings(&["cl.exe", "/I", "inc.cpp", "/c", "src/a.cpp", "/Foa.obj"]);
        assert_eq!(find_source(&args).unwrap(), "src/a.cpp");
    }

    #[test]
    fn ambiguous_without_layout_is_rejected() {
        let args = strings(&["gcc", "a.c", "b.c"]);
        assert!(find_source(&args).unwrap_err().message.contains("-o or /c"));
    }

    #[test]
    fn wrong_layout_is_rejected() {
        let args = strings(&["gcc", "a.c", "b.c", "-c", "-o", "x.o"]);
        assert!(find_source(&args).unwrap_err().message.contains("seems to be wrong"));
    }

    #[test]
    fn no_source_is_rejected() {
        assert!(find_source(&strings(&["gcc", "-c"])).is_err());
    }

    #[test]
    fn injects_cpp_flag_for_h_headers() {
        let mut args = strings(&["clang", "-c", "a.cc"]);
        inject_language_flag(&mut args, "a.cc", &headers(&["a.h"]), CompilerFamily::Gcc);
        assert_eq!(args, strings(&["clang", "-xc++", "-c", "a.cc"]));
    }

    #[test]
    fn msvc_gets_tp() {
        let mut args = strings(&["cl.exe", "/c", "a.cpp"]);
        inject_language_flag(&mut args, "a.cpp", &headers(&["a.h"]), CompilerFamily::Msvc);
        assert_eq!(args[1], "/TP");
    }

    #[test]
    fn leaves_c_and_explicit_languages_alone() {
        let mut args = strings(&["clang", "-c", "a.c"]);
        inject_language_flag(&mut args, "a.c", &headers(&["a.h"]), CompilerFamily::Gcc);
        assert_eq!(args.len(), 3);

        let mut args = strings(&["clang", "-ObjC++", "-c", "a.mm"]);
        inject_language_flag(&mut args, "a.mm", &headers(&["a.h"]), CompilerFamily::Gcc);
        assert_eq!(args.len(), 4);

        let mut args = strings(&["clang", "-c", "a.cc"]);
        inject_language_flag(&mut args, "a.cc", &headers(&["a.hpp"]), CompilerFamily::Gcc);
        assert_eq!(args.len(), 3);
    }
}
