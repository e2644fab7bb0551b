//! Configuration types deserialized from `compdb.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;

/// Default location of the Emscripten config file, relative to the workspace.
pub const DEFAULT_EMSCRIPTEN_CONFIG: &str = "external/emsdk/emscripten_toolchain/emscripten_config";

/// The top-level configuration parsed from `compdb.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompdbConfig {
    /// Extraction behavior (header policy, parallelism).
    #[serde(default)]
    pub extract: ExtractConfig,
    /// Settings for MSVC-family drivers.
    #[serde(default)]
    pub msvc: MsvcConfig,
    /// Settings for unwrapping `emcc`.
    #[serde(default)]
    pub emscripten: EmscriptenConfig,
}

/// Controls which files are emitted and how many actions run at once.
#[derive(Debug, Default, Deserialize)]
pub struct ExtractConfig {
    /// Which discovered headers get their own entries.
    #[serde(default)]
    pub exclude_headers: HeaderExclusion,
    /// Drop actions owned by external targets entirely.
    #[serde(default)]
    pub exclude_external_sources: bool,
    /// Worker count. `0` selects `min(32, cpu_count + 4)`.
    #[serde(default)]
    pub jobs: usize,
}

/// Which headers are excluded from the compilation database.
#[derive(Debug, Default, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HeaderExclusion {
    /// Emit every header (default).
    #[default]
    None,
    /// Skip headers that live outside the main workspace.
    External,
    /// Skip header discovery altogether.
    All,
}

/// Settings for `cl.exe` and `clang-cl`.
#[derive(Debug, Default, Deserialize)]
pub struct MsvcConfig {
    /// Directories placed on `INCLUDE` during header discovery.
    ///
    /// Accepts either a single string or a list of strings.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub default_include_paths: Vec<String>,
}

/// Settings for the `emcc` unwrap stage.
#[derive(Debug, Deserialize)]
pub struct EmscriptenConfig {
    /// Executable substituted for emcc's underlying compiler.
    ///
    /// When unset, `compdb-print-args` next to the running executable is used.
    #[serde(default)]
    pub interceptor: Option<PathBuf>,
    /// Emscripten config file, relative to the workspace root.
    #[serde(default = "default_emscripten_config")]
    pub config: String,
}

impl Default for EmscriptenConfig {
    fn default() -> Self {
        Self {
            interceptor: None,
            config: default_emscripten_config(),
        }
    }
}

fn default_emscripten_config() -> String {
    DEFAULT_EMSCRIPTEN_CONFIG.to_string()
}

/// Deserializes a field that can be either a single string or a list of strings.
///
/// Allows `default_include_paths = "C:/inc"` as well as
/// `default_include_paths = ["C:/inc", "C:/sdk/inc"]`.
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}
