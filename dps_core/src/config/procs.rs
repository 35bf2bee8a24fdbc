//! Proc configuration loading

use super::ConfigError;
use crate::procs::{ProcDescriptor, ProcRegistry};
use serde::Deserialize;
use std::path::Path;

/// Container for proc configurations
#[derive(Debug, Clone, Deserialize)]
pub struct ProcsConfig {
    #[serde(default)]
    pub procs: Vec<ProcDescriptor>,
}

impl ProcsConfig {
    /// Build a registry, rejecting duplicate names
    pub fn into_registry(self) -> Result<ProcRegistry, ConfigError> {
        let mut registry = ProcRegistry::new();
        for proc in self.procs {
            if registry.get(&proc.name).is_some() {
                return Err(ConfigError::ValidationError(format!(
                    "Duplicate proc '{}'",
                    proc.name
                )));
            }
            registry.register(proc);
        }
        Ok(registry)
    }
}

/// Load proc configurations from a TOML file
pub fn load_proc_configs(path: &Path) -> Result<ProcRegistry, ConfigError> {
    let config: ProcsConfig = super::load_toml(path)?;
    config.into_registry()
}

/// Load proc configurations from a TOML string
pub fn parse_proc_configs(content: &str) -> Result<ProcRegistry, ConfigError> {
    let config: ProcsConfig = super::parse_toml(content)?;
    config.into_registry()
}
