//! Damage model - per-hit damage supplied by a specialization

use crate::stat_block::StatVector;
use crate::types::DamageCategory;
use serde::{Deserialize, Serialize};

/// Damage of one non-crit hit and one crit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageTuple {
    pub base: f64,
    pub crit: f64,
}

impl DamageTuple {
    pub fn new(base: f64, crit: f64) -> Self {
        DamageTuple { base, crit }
    }

    /// Crit damage derived from a crit multiplier
    pub fn with_crit_multiplier(base: f64, crit_multiplier: f64) -> Self {
        DamageTuple {
            base,
            crit: base * crit_multiplier,
        }
    }

    pub fn scaled(self, factor: f64) -> Self {
        DamageTuple {
            base: self.base * factor,
            crit: self.crit * factor,
        }
    }
}

/// Damage of an ability, flat or by resource spent
#[derive(Debug, Clone, PartialEq)]
pub enum DamageHits {
    Flat(DamageTuple),
    /// Indexed by resource count at use; index 0 is never used
    PerResource(Vec<DamageTuple>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AbilityDamage {
    pub category: DamageCategory,
    pub hits: DamageHits,
}

impl AbilityDamage {
    pub fn flat(category: DamageCategory, damage: DamageTuple) -> Self {
        AbilityDamage {
            category,
            hits: DamageHits::Flat(damage),
        }
    }

    pub fn per_resource(category: DamageCategory, damage: Vec<DamageTuple>) -> Self {
        AbilityDamage {
            category,
            hits: DamageHits::PerResource(damage),
        }
    }
}

/// Specialization damage formulas
pub trait DamageModel {
    /// Damage of an ability at the given stats; `None` if it deals none
    fn ability_damage(&self, key: &str, stats: &StatVector) -> Option<AbilityDamage>;

    /// Crit chance of a damage category at the given stats
    fn crit_rate(&self, category: DamageCategory, stats: &StatVector) -> f64;

    /// Raid-wide damage multiplier for a category, applied to proc damage
    fn damage_multiplier(&self, _category: DamageCategory) -> f64 {
        1.0
    }

    /// Damage of a crit relative to a normal hit
    fn crit_damage_multiplier(&self) -> f64 {
        2.0
    }
}
