//! Armour - Physical damage mitigation against the target's armor

use serde::{Deserialize, Serialize};

/// Armor formula constants
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ArmorConstants {
    /// Level-dependent armor parameter in `param / (param + armor)`
    #[serde(default = "default_mitigation_parameter")]
    pub mitigation_parameter: f64,
    /// Armor of a raid boss before debuffs
    #[serde(default = "default_target_base_armor")]
    pub target_base_armor: f64,
}

impl Default for ArmorConstants {
    fn default() -> Self {
        ArmorConstants {
            mitigation_parameter: default_mitigation_parameter(),
            target_base_armor: default_target_base_armor(),
        }
    }
}

fn default_mitigation_parameter() -> f64 {
    26070.0
}
fn default_target_base_armor() -> f64 {
    11977.0
}

impl ArmorConstants {
    /// Fraction of physical damage that gets through `armor`
    pub fn mitigation_multiplier(&self, armor: f64) -> f64 {
        armor_mitigation_multiplier(self.mitigation_parameter, armor)
    }

    /// Multiplier against the target's base armor
    pub fn base_multiplier(&self) -> f64 {
        self.mitigation_multiplier(self.target_base_armor)
    }
}

/// Fraction of physical damage that gets through armor
///
/// `param / (param + armor)`. Negative armor is treated as none.
pub fn armor_mitigation_multiplier(mitigation_parameter: f64, armor: f64) -> f64 {
    let armor = armor.max(0.0);
    mitigation_parameter / (mitigation_parameter + armor)
}

/// Physical damage after armor
pub fn armor_mitigate(damage: f64, mitigation_parameter: f64, armor: f64) -> f64 {
    if damage <= 0.0 {
        return 0.0;
    }
    damage * armor_mitigation_multiplier(mitigation_parameter, armor)
}
