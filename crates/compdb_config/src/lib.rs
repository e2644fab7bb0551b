//! Parsing and validation of `compdb.toml` extraction settings.
//!
//! The file is optional. When it is absent every setting takes its default,
//! so a bare workspace extracts with all headers and no job limit override.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;
