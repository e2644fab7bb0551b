//! Diagnostic codes with category prefixes for structured advisory identification.

use std::fmt;

/// The category of a diagnostic code, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Category {
    /// Action-level failures, prefixed with `E`.
    Error,
    /// Recoverable advisories, prefixed with `W`.
    Warning,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
        }
    }
}

/// A structured diagnostic code combining a category prefix and a numeric identifier.
///
/// Displayed as the category prefix followed by a zero-padded 3-digit number,
/// e.g. `W001`, `E001`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// A source file named by an action does not exist yet.
    pub const MISSING_SOURCE: Self = Self::new(Category::Warning, 1);
    /// The compiler printed warnings or errors while locating headers.
    pub const HEADER_SEARCH_OUTPUT: Self = Self::new(Category::Warning, 2);
    /// A header cache file could not be decoded and was ignored.
    pub const CORRUPTED_CACHE: Self = Self::new(Category::Warning, 3);
    /// No output file could be found in an action's arguments.
    pub const OUTPUT_UNDETECTED: Self = Self::new(Category::Warning, 4);
    /// The input listed no applicable compile actions.
    pub const NO_COMMANDS: Self = Self::new(Category::Warning, 5);
    /// An action was skipped because it could not be normalized.
    pub const ACTION_SKIPPED: Self = Self::new(Category::Error, 1);

    /// Creates a new diagnostic code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}
