//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::CompdbConfig;
use std::path::Path;

/// File name looked up at the workspace root.
pub const CONFIG_FILE_NAME: &str = "compdb.toml";

const MAX_JOBS: usize = 1024;

/// Loads `compdb.toml` from a workspace directory.
///
/// A missing file is not an error: the defaults are returned instead.
pub fn load_config(workspace: &Path) -> Result<CompdbConfig, ConfigError> {
    let config_path = workspace.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return Ok(CompdbConfig::default());
    }
    load_config_file(&config_path)
}

/// Loads and validates an explicitly named configuration file.
pub fn load_config_file(path: &Path) -> Result<CompdbConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `compdb.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<CompdbConfig, ConfigError> {
    let config: CompdbConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that configuration values are in range.
fn validate_config(config: &CompdbConfig) -> Result<(), ConfigError> {
    if config.extract.jobs > MAX_JOBS {
        return Err(ConfigError::ValidationError(format!(
            "extract.jobs must be at most {MAX_JOBS}, got {}",
            config.extract.jobs
        )));
    }
    if config.emscripten.config.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "emscripten.config must not be empty".to_string(),
        ));
    }
    Ok(())
}
