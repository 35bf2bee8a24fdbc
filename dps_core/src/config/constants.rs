//! Combat constants configuration

use super::{load_toml, ConfigError};
use crate::defense::{ArmorConstants, HitTable};
use crate::stat_block::RatingTable;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunable combat constants
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CombatConstants {
    #[serde(default)]
    pub armor: ArmorConstants,
    #[serde(default)]
    pub resolver: ResolverConstants,
    #[serde(default)]
    pub ratings: RatingTable,
    #[serde(default)]
    pub hit: HitTable,
}

impl CombatConstants {
    /// Load and validate constants from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let constants: CombatConstants = load_toml(path)?;
        constants.validate()?;
        Ok(constants)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("armor.mitigation_parameter", self.armor.mitigation_parameter),
            ("resolver.tolerance", self.resolver.tolerance),
            ("resolver.fight_duration", self.resolver.fight_duration),
            ("ratings.haste_per_percent", self.ratings.haste_per_percent),
            ("ratings.crit_per_percent", self.ratings.crit_per_percent),
            ("ratings.mastery_per_point", self.ratings.mastery_per_point),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if self.resolver.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "resolver.max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResolverConstants {
    /// Iteration cap before giving up on convergence
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Largest rate change still counted as converged
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Fight length in seconds
    #[serde(default = "default_fight_duration")]
    pub fight_duration: f64,
}

impl Default for ResolverConstants {
    fn default() -> Self {
        ResolverConstants {
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            fight_duration: default_fight_duration(),
        }
    }
}

fn default_max_iterations() -> u32 {
    20
}
fn default_tolerance() -> f64 {
    1e-7
}
fn default_fight_duration() -> f64 {
    300.0
}
