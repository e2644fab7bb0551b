//! Compile actions consumed by the pipeline and the entries it produces.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Unique header paths discovered for one action, kept sorted for stable output.
pub type HeaderSet = BTreeSet<String>;

/// Source files a normalized command applies to.
pub type SourceSet = BTreeSet<String>;

/// One build-system-recorded invocation of a compiler on one source file.
///
/// The pipeline rewrites `arguments` in place as it patches; every other field
/// is fixed once the action is constructed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileAction {
    /// The literal argv of the compiler invocation.
    pub arguments: Vec<String>,
    /// Environment the build system ran the compiler with.
    #[serde(default)]
    pub environment_variables: BTreeMap<String, String>,
    /// Opaque identity hash, stable iff the action's inputs and flags are unchanged.
    #[serde(default)]
    pub action_key: String,
    /// Identifier of the target that owns this action.
    #[serde(default)]
    pub target_id: String,
    /// Whether the owning target lives outside the main workspace.
    #[serde(default)]
    pub is_external: bool,
}

impl CompileAction {
    /// Creates an action from an argument vector with no environment or key.
    pub fn new<I, S>(arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            arguments: arguments.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Sets the action key.
    pub fn with_action_key(mut self, key: impl Into<String>) -> Self {
        self.action_key = key.into();
        self
    }

    /// Adds one environment variable.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment_variables.insert(key.into(), value.into());
        self
    }

    /// Marks the action as belonging to an external target.
    pub fn external(mut self) -> Self {
        self.is_external = true;
        self
    }

    /// The compiler executable (`argv[0]`), or an empty string for an empty argv.
    pub fn compiler(&self) -> &str {
        self.arguments.first().map(String::as_str).unwrap_or("")
    }
}

/// One record of a compilation database.
///
/// Serializes as an object with exactly the keys `file`, `arguments` and
/// `directory`, the interchange format consumed by source-navigation tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileCommandEntry {
    /// The file the command applies to.
    pub file: String,
    /// The fully de-specialized argv.
    pub arguments: Vec<String>,
    /// Absolute workspace root the command runs from.
    pub directory: String,
}
