//! Rating to percentage conversions

use serde::{Deserialize, Serialize};

/// Converts combat ratings into their effects
///
/// The resolver treats these as opaque pure functions.
pub trait RatingConversions: Send + Sync {
    /// Haste multiplier from haste rating (1.0 = no haste)
    fn haste_multiplier(&self, rating: f64) -> f64;

    /// Crit chance as a fraction from crit rating
    fn crit_chance(&self, rating: f64) -> f64;

    /// Mastery points from mastery rating, including base mastery
    fn mastery_effect(&self, rating: f64) -> f64;
}

/// Linear rating table for a single character level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingTable {
    /// Haste rating per 1% haste
    #[serde(default = "default_haste_per_percent")]
    pub haste_per_percent: f64,
    /// Crit rating per 1% crit
    #[serde(default = "default_crit_per_percent")]
    pub crit_per_percent: f64,
    /// Mastery rating per mastery point
    #[serde(default = "default_mastery_per_point")]
    pub mastery_per_point: f64,
    /// Mastery points every character has
    #[serde(default = "default_base_mastery")]
    pub base_mastery: f64,
}

impl Default for RatingTable {
    fn default() -> Self {
        RatingTable {
            haste_per_percent: default_haste_per_percent(),
            crit_per_percent: default_crit_per_percent(),
            mastery_per_point: default_mastery_per_point(),
            base_mastery: default_base_mastery(),
        }
    }
}

fn default_haste_per_percent() -> f64 {
    425.0
}
fn default_crit_per_percent() -> f64 {
    600.0
}
fn default_mastery_per_point() -> f64 {
    600.0
}
fn default_base_mastery() -> f64 {
    8.0
}

impl RatingConversions for RatingTable {
    fn haste_multiplier(&self, rating: f64) -> f64 {
        1.0 + rating / (self.haste_per_percent * 100.0)
    }

    fn crit_chance(&self, rating: f64) -> f64 {
        rating / (self.crit_per_percent * 100.0)
    }

    fn mastery_effect(&self, rating: f64) -> f64 {
        self.base_mastery + rating / self.mastery_per_point
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haste_multiplier() {
        let table = RatingTable::default();
        assert!((table.haste_multiplier(0.0) - 1.0).abs() < f64::EPSILON);
        // 4250 rating = 10% haste
        assert!((table.haste_multiplier(4250.0) - 1.10).abs() < 1e-12);
    }

    #[test]
    fn test_crit_and_mastery() {
        let table = RatingTable::default();
        assert!((table.crit_chance(6000.0) - 0.10).abs() < 1e-12);
        assert!((table.mastery_effect(1200.0) - 10.0).abs() < 1e-12);
    }
}
