//! StatVector - The working set of stats the resolver iterates on

mod computed;
mod rating;

pub use computed::DerivedStats;
pub use rating::{RatingConversions, RatingTable};

use crate::types::Stat;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Stat totals for one resolution
///
/// Ratings are kept as raw rating points; conversion to percentages goes
/// through [`RatingConversions`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatVector {
    pub agility: f64,
    pub attack_power: f64,
    pub crit_rating: f64,
    pub haste_rating: f64,
    pub mastery_rating: f64,
}

impl StatVector {
    /// Get the value of a stat
    pub fn get(&self, stat: Stat) -> f64 {
        self[stat]
    }

    /// Add to a stat
    pub fn add(&mut self, stat: Stat, value: f64) {
        self[stat] += value;
    }

    /// Copy with one stat raised by `delta`
    pub fn with_bonus(&self, stat: Stat, delta: f64) -> Self {
        let mut bumped = *self;
        bumped.add(stat, delta);
        bumped
    }

    /// Apply per-stat multipliers
    pub fn scaled_by(&self, modifiers: &StatModifiers) -> Self {
        let mut scaled = *self;
        for &stat in Stat::all() {
            scaled[stat] *= modifiers.get(stat);
        }
        scaled
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stat, f64)> + '_ {
        Stat::all().iter().map(move |&stat| (stat, self[stat]))
    }
}

impl Index<Stat> for StatVector {
    type Output = f64;

    fn index(&self, stat: Stat) -> &f64 {
        match stat {
            Stat::Agility => &self.agility,
            Stat::AttackPower => &self.attack_power,
            Stat::CritRating => &self.crit_rating,
            Stat::HasteRating => &self.haste_rating,
            Stat::MasteryRating => &self.mastery_rating,
        }
    }
}

impl IndexMut<Stat> for StatVector {
    fn index_mut(&mut self, stat: Stat) -> &mut f64 {
        match stat {
            Stat::Agility => &mut self.agility,
            Stat::AttackPower => &mut self.attack_power,
            Stat::CritRating => &mut self.crit_rating,
            Stat::HasteRating => &mut self.haste_rating,
            Stat::MasteryRating => &mut self.mastery_rating,
        }
    }
}

/// Per-stat multipliers (talents, racials, set bonuses)
///
/// Applied to base stats when the working vector is rebuilt and to every
/// proc contribution for the same stat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatModifiers {
    pub agility: f64,
    pub attack_power: f64,
    pub crit_rating: f64,
    pub haste_rating: f64,
    pub mastery_rating: f64,
}

impl Default for StatModifiers {
    fn default() -> Self {
        StatModifiers {
            agility: 1.0,
            attack_power: 1.0,
            crit_rating: 1.0,
            haste_rating: 1.0,
            mastery_rating: 1.0,
        }
    }
}

impl StatModifiers {
    pub fn get(&self, stat: Stat) -> f64 {
        match stat {
            Stat::Agility => self.agility,
            Stat::AttackPower => self.attack_power,
            Stat::CritRating => self.crit_rating,
            Stat::HasteRating => self.haste_rating,
            Stat::MasteryRating => self.mastery_rating,
        }
    }
}
