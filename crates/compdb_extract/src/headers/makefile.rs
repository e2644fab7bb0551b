//! Parsing makefile-format dependency output (`-M` and friends).

use compdb_common::{ActionError, ActionResult, HeaderSet};

const OBJECT_EXTENSIONS: [&str; 2] = [".o", ".obj"];

/// Extracts the headers from a single `target: source header...` rule.
///
/// The first dependency must be the source file, checked against
/// `expected_source` when one is given. With `windows` set, lone backslash
/// separators are turned into forward slashes before unquoting, since
/// Windows GCC mixes them with backslash-escaped spaces.
pub fn parse_dependencies(
    content: &str,
    expected_source: Option<&str>,
    windows: bool,
) -> ActionResult<HeaderSet> {
    let content = content.replace("\r\n", "\n");
    let malformed = |what: &str| {
        ActionError::new(format!(
            "Something went wrong in makefile parsing to get headers. {what} Output:\n{content}"
        ))
    };

    let (target, dependencies) = content
        .split_once(':')
        .ok_or_else(|| malformed("There should be a `target:` rule."))?;
    let target = target.trim();
    if !OBJECT_EXTENSIONS.iter().any(|ext| target.ends_with(ext)) {
        return Err(malformed("The target should be an object file."));
    }

    let mut dependencies = dependencies.replace("\\\n", "");
    if windows {
        dependencies = forward_slash_separators(&dependencies);
    }
    let tokens = shell_split(&dependencies).map_err(malformed)?;

    let (source, headers) = tokens
        .split_first()
        .ok_or_else(|| malformed("The source file should be the first dependency."))?;
    if let Some(expected) = expected_source {
        if !source.ends_with(expected) {
            return Err(malformed("The first dependency should be the source file."));
        }
    }
    Ok(headers.iter().cloned().collect())
}

/// Replaces each backslash not followed by a space or another backslash.
fn forward_slash_separators(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('\\', Some(&next)) if next != ' ' && next != '\\' => out.push('/'),
            _ => out.push(c),
        }
    }
    out
}

/// Splits `input` into words using POSIX shell quoting.
fn shell_split(input: &str) -> Result<Vec<String>, &'static str> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
            }
            '\\' => {
                word.push(chars.next().ok_or("No escaped character.")?);
                in_word = true;
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(quoted) => word.push(quoted),
                        None => return Err("No closing quotation."),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(escaped @ ('"' | '\\')) => word.push(escaped),
                            Some(other) => {
                                word.push('\\');
                                word.push(other);
                            }
                            None => return Err("No closing quotation."),
                        },
                        Some(quoted) => word.push(quoted),
                        None => return Err("No closing quotation."),
                    }
                }
            }
            _ => {
                word.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        words.push(word);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> HeaderSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn wrapped_rule() {
        let deps = "foo.o : foo.cc bar.h \\\n     baz.hpp\n";
        assert_eq!(
            parse_dependencies(deps, Some("foo.cc"), false).unwrap(),
            set(&["bar.h", "baz.hpp"])
        );
    }

    #[test]
    fn duplicates_collapse() {
        let deps = "a.o: a.c x.h y.h x.h\n";
        assert_eq!(parse_dependencies(deps, None, false).unwrap(), set(&["x.h", "y.h"]));
    }

    #[test]
    fn crlf_and_obj_targets() {
        let deps = "a.obj: a.c \\\r\n x.h\r\n";
        assert_eq!(parse_dependencies(deps, Some("a.c"), false).unwrap(), set(&["x.h"]));
    }

    #[test]
    fn escaped_spaces() {
        let deps = "a.o: src/a.c my\\ dir/x.h\n";
        assert_eq!(parse_dependencies(deps, None, false).unwrap(), set(&["my dir/x.h"]));
    }

    #[test]
    fn windows_separators() {
        let deps = "a.o: src\\a.c C:\\Program\\ Files\\x.h\n";
        assert_eq!(
            parse_dependencies(deps, Some("src/a.c"), true).unwrap(),
            set(&["C:/Program Files/x.h"])
        );
    }

    #[test]
    fn source_only_gives_no_headers() {
        assert!(parse_dependencies("a.o: a.c\n", Some("a.c"), false).unwrap().is_empty());
    }

    #[test]
    fn rejects_non_object_target() {
        let err = parse_dependencies("a.d: a.c x.h", None, false).unwrap_err();
        assert!(err.message.contains("object file"));
    }

    #[test]
    fn rejects_wrong_source() {
        let err = parse_dependencies("a.o: b.c x.h", Some("a.c"), false).unwrap_err();
        assert!(err.message.contains("first dependency"));
    }

    #[test]
    fn rejects_missing_rule() {
        assert!(parse_dependencies("clang: error: no input files", None, false).is_err());
        assert!(parse_dependencies("a.o:", None, false).is_err());
    }

    #[test]
    fn shell_quoting() {
        assert_eq!(
            shell_split(r#"a 'b c' "d \"e\" \x" f\ g"#).unwrap(),
            vec!["a", "b c", r#"d "e" \x"#, "f g"]
        );
        assert_eq!(shell_split("''").unwrap(), vec![""]);
        assert!(shell_split("'open").is_err());
        assert!(shell_split("trailing\\").is_err());
    }

    #[test]
    fn forward_slashes_keep_escapes() {
        assert_eq!(forward_slash_separators(r"a\b\ c\\d\"), r"a/b\ c\/d\");
    }
}
