//! Hit tables - chance for attacks and spells to land on a boss target

use crate::types::DamageCategory;
use serde::{Deserialize, Serialize};

/// Weapon configuration, which sets the melee miss rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeaponSetup {
    OneHand,
    #[default]
    DualWield,
}

/// Base avoidance rates of the target
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HitTable {
    #[serde(default = "default_one_hand_miss")]
    pub one_hand_miss: f64,
    #[serde(default = "default_dual_wield_miss")]
    pub dual_wield_miss: f64,
    #[serde(default = "default_spell_miss")]
    pub spell_miss: f64,
    #[serde(default = "default_dodge")]
    pub dodge: f64,
    #[serde(default = "default_parry")]
    pub parry: f64,
}

impl Default for HitTable {
    fn default() -> Self {
        HitTable {
            one_hand_miss: default_one_hand_miss(),
            dual_wield_miss: default_dual_wield_miss(),
            spell_miss: default_spell_miss(),
            dodge: default_dodge(),
            parry: default_parry(),
        }
    }
}

fn default_one_hand_miss() -> f64 {
    0.08
}
fn default_dual_wield_miss() -> f64 {
    0.27
}
fn default_spell_miss() -> f64 {
    0.17
}
fn default_dodge() -> f64 {
    0.065
}
fn default_parry() -> f64 {
    0.14
}

/// Hit and expertise bonuses, as fractions
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HitBonuses {
    /// Reduces melee miss chance
    pub melee_hit: f64,
    /// Reduces spell miss chance
    pub spell_hit: f64,
    /// Reduces dodge and parry chance
    pub expertise: f64,
}

impl HitTable {
    /// Base melee miss rate for a weapon setup
    pub fn base_miss(&self, setup: WeaponSetup) -> f64 {
        match setup {
            WeaponSetup::OneHand => self.one_hand_miss,
            WeaponSetup::DualWield => self.dual_wield_miss,
        }
    }

    /// Chance for a melee attack to land
    ///
    /// Attacks from behind are dodgeable but not parryable.
    pub fn melee_hit_chance(
        &self,
        setup: WeaponSetup,
        bonuses: &HitBonuses,
        dodgeable: bool,
        parryable: bool,
    ) -> f64 {
        melee_hit_chance(
            self.base_miss(setup),
            bonuses.melee_hit,
            bonuses.expertise,
            if dodgeable { self.dodge } else { 0.0 },
            if parryable { self.parry } else { 0.0 },
        )
    }

    /// Chance for a spell to land
    pub fn spell_hit_chance(&self, bonuses: &HitBonuses) -> f64 {
        spell_hit_chance(self.spell_miss, bonuses.spell_hit)
    }

    /// Hit chances for strikes and spells
    pub fn hit_chances(&self, setup: WeaponSetup, bonuses: &HitBonuses) -> HitChances {
        HitChances {
            strike: self.melee_hit_chance(setup, bonuses, true, false),
            spell: self.spell_hit_chance(bonuses),
        }
    }
}

/// Chance to land a melee attack
///
/// Every avoidance term is floored at zero before being summed.
pub fn melee_hit_chance(
    base_miss: f64,
    hit: f64,
    expertise: f64,
    base_dodge: f64,
    base_parry: f64,
) -> f64 {
    let miss = (base_miss - hit).max(0.0);
    let dodge = (base_dodge - expertise).max(0.0);
    let parry = (base_parry - expertise).max(0.0);
    1.0 - (miss + dodge + parry)
}

/// Chance to land a spell
pub fn spell_hit_chance(base_miss: f64, hit: f64) -> f64 {
    1.0 - (base_miss - hit).max(0.0)
}

/// Hit chance per damage-proc category group
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitChances {
    /// Physical and melee-spell damage
    pub strike: f64,
    /// Spell damage
    pub spell: f64,
}

impl Default for HitChances {
    fn default() -> Self {
        HitChances {
            strike: 1.0,
            spell: 1.0,
        }
    }
}

impl HitChances {
    /// Hit chance used for a damage category
    pub fn for_category(&self, category: DamageCategory) -> f64 {
        match category {
            DamageCategory::Spell => self.spell,
            DamageCategory::Physical | DamageCategory::MeleeSpell => self.strike,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dual_wield_unbuffed() {
        let table = HitTable::default();
        let chance = table.melee_hit_chance(WeaponSetup::DualWield, &HitBonuses::default(), true, false);
        assert!((chance - (1.0 - 0.27 - 0.065)).abs() < 1e-12);
    }

    #[test]
    fn test_hit_capped_special_attacks() {
        let table = HitTable::default();
        let bonuses = HitBonuses {
            melee_hit: 0.08,
            spell_hit: 0.17,
            expertise: 0.065,
        };
        let chances = table.hit_chances(WeaponSetup::OneHand, &bonuses);
        assert!((chances.strike - 1.0).abs() < 1e-12);
        assert!((chances.spell - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_excess_hit_does_not_overshoot() {
        assert!((spell_hit_chance(0.17, 0.5) - 1.0).abs() < f64::EPSILON);
        assert!((melee_hit_chance(0.08, 0.2, 0.2, 0.065, 0.14) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parry_from_front() {
        let table = HitTable::default();
        let bonuses = HitBonuses::default();
        let behind = table.melee_hit_chance(WeaponSetup::OneHand, &bonuses, true, false);
        let front = table.melee_hit_chance(WeaponSetup::OneHand, &bonuses, true, true);
        assert!((behind - front - 0.14).abs() < 1e-12);
    }

    #[test]
    fn test_category_lookup() {
        let chances = HitChances {
            strike: 0.9,
            spell: 0.8,
        };
        assert!((chances.for_category(DamageCategory::Spell) - 0.8).abs() < f64::EPSILON);
        assert!((chances.for_category(DamageCategory::Physical) - 0.9).abs() < f64::EPSILON);
        assert!((chances.for_category(DamageCategory::MeleeSpell) - 0.9).abs() < f64::EPSILON);
    }
}
