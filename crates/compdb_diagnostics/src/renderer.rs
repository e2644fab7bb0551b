//! Terminal rendering of advisories.

use crate::diagnostic::{Diagnostic, Severity};

const RESET: &str = "\x1b[0m";
const FG_RED: &str = "\x1b[0;31m";
const FG_GREEN: &str = "\x1b[0;32m";
const FG_YELLOW: &str = "\x1b[0;33m";
const FG_BLUE: &str = "\x1b[0;34m";

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic into a formatted string.
    fn render(&self, diag: &Diagnostic) -> String;

    /// Renders a sequence of diagnostics, one after another.
    fn render_all(&self, diags: &[Diagnostic]) -> String {
        diags.iter().map(|d| self.render(d)).collect()
    }
}

/// Renders diagnostics as `>>>`-prefixed blocks wrapped in SGR colors.
///
/// Produces output like:
/// ```text
/// >>> warning[W001]: A source file you compile doesn't (yet) exist: gen/foo.cc
///     It's probably a generated file, and you haven't yet run a build to generate it.
/// ```
/// Raw detail follows the colored block uncolored.
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn sgr(&self, severity: Severity) -> (&'static str, &'static str) {
        if !self.color {
            return ("", "");
        }
        let start = match severity {
            Severity::Info => FG_BLUE,
            Severity::Success => FG_GREEN,
            Severity::Warning => FG_YELLOW,
            Severity::Error => FG_RED,
        };
        (start, RESET)
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let (start, reset) = self.sgr(diag.severity);
        let mut out = String::new();

        out.push_str(start);
        match diag.code {
            Some(code) => out.push_str(&format!(">>> {}[{code}]: {}", diag.severity, diag.message)),
            None => out.push_str(&format!(">>> {}", diag.message)),
        }
        for note in &diag.notes {
            out.push_str(&format!("\n    {note}"));
        }
        out.push_str(reset);
        out.push('\n');

        if let Some(detail) = &diag.detail {
            out.push_str(detail);
            if !detail.ends_with('\n') {
                out.push('\n');
            }
        }

        out
    }
}
