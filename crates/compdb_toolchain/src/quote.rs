//! Command-line quoting for parameter files.

/// Joins arguments the way the MS C runtime splits them.
///
/// Arguments containing a space or tab, and empty arguments, are wrapped in
/// double quotes. Backslashes are literal unless they precede a double quote,
/// in which case they are doubled and the quote is escaped.
pub fn list2cmdline<S: AsRef<str>>(args: &[S]) -> String {
    let mut out = String::new();
    for arg in args {
        let arg = arg.as_ref();
        if !out.is_empty() {
            out.push(' ');
        }
        let needs_quotes = arg.is_empty() || arg.contains(' ') || arg.contains('\t');
        if needs_quotes {
            out.push('"');
        }
        let mut backslashes = 0usize;
        for c in arg.chars() {
            match c {
                '\\' => backslashes += 1,
                '"' => {
                    out.extend(std::iter::repeat('\\').take(backslashes * 2));
                    backslashes = 0;
                    out.push_str("\\\"");
                }
                _ => {
                    out.extend(std::iter::repeat('\\').take(backslashes));
                    backslashes = 0;
                    out.push(c);
                }
            }
        }
        out.extend(std::iter::repeat('\\').take(backslashes));
        if needs_quotes {
            // Trailing backslashes would otherwise escape the closing quote.
            out.extend(std::iter::repeat('\\').take(backslashes));
            out.push('"');
        }
    }
    out
}

/// Quotes one argument for a GCC-style response file or a POSIX shell.
///
/// Every character outside a conservative safe set is backslash-escaped,
/// which both libiberty's response-file reader and `sh` accept.
pub fn posix_quote(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }
    let mut out = String::with_capacity(arg.len());
    for c in arg.chars() {
        if !is_shell_safe(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn is_shell_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '@' | '%' | '+' | '=' | ':' | ',' | '.' | '/' | '-')
}

/// Renders arguments as parameter-file contents using the host's quoting rules.
pub fn param_file_contents<S: AsRef<str>>(args: &[S]) -> String {
    if cfg!(windows) {
        list2cmdline(args)
    } else {
        args.iter()
            .map(|a| posix_quote(a.as_ref()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
