//! Computed/derived stat calculations for StatVector

use super::{RatingConversions, StatVector};
use serde::Serialize;

/// Derived combat numbers for a resolved stat vector
///
/// Rotation and damage models usually need these rather than raw ratings.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DerivedStats {
    /// Attack power including agility's contribution
    pub attack_power: f64,
    /// Haste multiplier from rating alone
    pub haste_multiplier: f64,
    /// Crit chance as a fraction, not capped
    pub crit_chance: f64,
    /// Mastery points
    pub mastery: f64,
}

impl StatVector {
    /// Attack power with agility converted at `ap_per_agility`
    pub fn effective_attack_power(&self, ap_per_agility: f64) -> f64 {
        self.attack_power + ap_per_agility * self.agility
    }

    /// Crit chance from rating plus agility at `agility_per_crit_percent`
    pub fn crit_chance(
        &self,
        conversions: &dyn RatingConversions,
        agility_per_crit_percent: f64,
    ) -> f64 {
        let from_agility = if agility_per_crit_percent > 0.0 {
            self.agility / agility_per_crit_percent / 100.0
        } else {
            0.0
        };
        conversions.crit_chance(self.crit_rating) + from_agility
    }

    /// Compute all derived numbers at once
    pub fn derive(
        &self,
        conversions: &dyn RatingConversions,
        ap_per_agility: f64,
        agility_per_crit_percent: f64,
    ) -> DerivedStats {
        DerivedStats {
            attack_power: self.effective_attack_power(ap_per_agility),
            haste_multiplier: conversions.haste_multiplier(self.haste_rating),
            crit_chance: self.crit_chance(conversions, agility_per_crit_percent),
            mastery: conversions.mastery_effect(self.mastery_rating),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stat_block::RatingTable;

    #[test]
    fn test_effective_attack_power() {
        let stats = StatVector {
            agility: 1000.0,
            attack_power: 500.0,
            ..Default::default()
        };
        assert!((stats.effective_attack_power(2.0) - 2500.0).abs() < 1e-9);
    }

    #[test]
    fn test_crit_from_rating_and_agility() {
        let stats = StatVector {
            agility: 1250.0,
            crit_rating: 600.0,
            ..Default::default()
        };
        let table = RatingTable::default();
        // 1% from rating, 1% from 1250 agility
        let crit = stats.crit_chance(&table, 1250.0);
        assert!((crit - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_derive() {
        let stats = StatVector {
            agility: 1259.0,
            haste_rating: 4250.0,
            mastery_rating: 1200.0,
            ..Default::default()
        };
        let derived = stats.derive(&RatingTable::default(), 2.0, 1259.0);
        assert!((derived.attack_power - 2518.0).abs() < 1e-9);
        assert!((derived.haste_multiplier - 1.1).abs() < 1e-12);
        assert!((derived.crit_chance - 0.01).abs() < 1e-12);
        assert!((derived.mastery - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_agility_scaling_ignored() {
        let stats = StatVector {
            agility: 1000.0,
            ..Default::default()
        };
        let table = RatingTable::default();
        assert!(stats.crit_chance(&table, 0.0).abs() < f64::EPSILON);
    }
}
