//! Configuration loading - combat constants, procs and scenario files are TOML

mod constants;
mod procs;

pub use constants::{CombatConstants, ResolverConstants};
pub use procs::{load_proc_configs, parse_proc_configs, ProcsConfig};

use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// Malformed TOML, or a proc or behaviour that failed validation
    #[error("Invalid TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Read a TOML file into any deserializable type
pub fn load_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::IoError {
        path: path.display().to_string(),
        source,
    })?;
    parse_toml(&content)
}

pub fn parse_toml<T: serde::de::DeserializeOwned>(content: &str) -> Result<T, ConfigError> {
    Ok(toml::from_str(content)?)
}
