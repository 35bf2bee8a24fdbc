//! Combo-point distribution - where a builder sequence ends up
//!
//! Given a per-action gain distribution and a target, computes the joint
//! distribution of (final total, actions taken) and the fraction of time
//! spent at each resource level while building.

use crate::error::{CalcError, CalcResult};
use std::collections::BTreeMap;

/// Allowed deviation of a probability table's sum from 1
pub const PROBABILITY_SUM_TOLERANCE: f64 = 1e-9;

/// Units gained per action, with probabilities summing to 1
#[derive(Debug, Clone, PartialEq)]
pub struct GainDistribution {
    gains: BTreeMap<u32, f64>,
}

impl GainDistribution {
    /// Validate a gain table
    pub fn new(gains: BTreeMap<u32, f64>) -> CalcResult<Self> {
        if gains.is_empty() {
            return Err(CalcError::configuration("gain distribution is empty"));
        }
        if let Some((gain, prob)) = gains.iter().find(|(_, p)| !p.is_finite() || **p < 0.0) {
            return Err(CalcError::configuration(format!(
                "gain {gain} has invalid probability {prob}"
            )));
        }
        let total: f64 = gains.values().sum();
        if (total - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
            return Err(CalcError::configuration(format!(
                "gain probabilities sum to {total}, not 1"
            )));
        }
        if gains.iter().any(|(&gain, &prob)| gain == 0 && prob > 0.0) {
            return Err(CalcError::unmodeled(
                "actions that gain no resource are not modeled",
            ));
        }
        Ok(GainDistribution { gains })
    }

    /// Always gain exactly `units`
    pub fn fixed(units: u32) -> CalcResult<Self> {
        Self::new(BTreeMap::from([(units, 1.0)]))
    }

    /// Expected units per action
    pub fn mean(&self) -> f64 {
        self.gains.iter().map(|(&g, &p)| g as f64 * p).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.gains.iter().map(|(&g, &p)| (g, p))
    }

    pub fn probability(&self, units: u32) -> f64 {
        self.gains.get(&units).copied().unwrap_or(0.0)
    }
}

/// Per-action gains from a base amount and independent "+1" chances
///
/// Each chance adds one more unit with that probability, independently of
/// the others. Zero chances are skipped.
pub fn gain_distribution(base: u32, extra_chances: &[f64]) -> CalcResult<GainDistribution> {
    let mut gains = BTreeMap::from([(base, 1.0)]);
    for &chance in extra_chances {
        if chance == 0.0 {
            continue;
        }
        if !(0.0..=1.0).contains(&chance) {
            return Err(CalcError::configuration(format!(
                "extra gain chance {chance} is not a probability"
            )));
        }
        let mut next = BTreeMap::new();
        for (&units, &prob) in &gains {
            let extra = units.checked_add(1).ok_or_else(|| {
                CalcError::configuration(format!("gain of {units} units cannot grow further"))
            })?;
            *next.entry(units).or_insert(0.0) += prob * (1.0 - chance);
            *next.entry(extra).or_insert(0.0) += prob * chance;
        }
        gains = next;
    }
    GainDistribution::new(gains)
}

/// Outcome of building from zero up to a target
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDistribution {
    /// `(final total, actions taken)` to probability
    pub outcomes: BTreeMap<(u32, u32), f64>,
    /// Fraction of time spent at each level, indexed `0..=ceiling`
    pub time_at_level: Vec<f64>,
    /// Mean units gained per action
    pub average_gain: f64,
}

impl ResourceDistribution {
    /// Distribution when the ceiling equals the target
    pub fn for_target(gains: &GainDistribution, target: u32) -> CalcResult<Self> {
        Self::compute(gains, target, target)
    }

    /// Build from zero until at least `target` units, clamping at `ceiling`
    pub fn compute(gains: &GainDistribution, target: u32, ceiling: u32) -> CalcResult<Self> {
        if target > ceiling {
            return Err(CalcError::unmodeled(format!(
                "target {target} is above the resource ceiling {ceiling}"
            )));
        }

        let mut time_at_level = vec![0.0; ceiling as usize + 1];
        let mut current: BTreeMap<(u32, u32), f64> = BTreeMap::from([((0, 0), 1.0)]);

        for floor in 1..=target {
            let mut next = BTreeMap::new();
            for (&(total, actions), &prob) in &current {
                if total >= floor {
                    *next.entry((total, actions)).or_insert(0.0) += prob;
                    continue;
                }
                for (gain, gain_prob) in gains.iter() {
                    let clamped = total.saturating_add(gain).min(ceiling);
                    let mass = prob * gain_prob;
                    time_at_level[clamped as usize] += mass;
                    *next.entry((clamped, actions + 1)).or_insert(0.0) += mass;
                }
            }
            current = next;
        }

        for (&(total, _), &prob) in &current {
            time_at_level[total as usize] += prob;
        }
        let weight: f64 = time_at_level.iter().sum();
        if weight > 0.0 {
            for level in &mut time_at_level {
                *level /= weight;
            }
        }

        Ok(ResourceDistribution {
            outcomes: current,
            time_at_level,
            average_gain: gains.mean(),
        })
    }

    /// Probability of each final total, indexed `0..=ceiling`
    pub fn final_total_distribution(&self) -> Vec<f64> {
        let mut totals = vec![0.0; self.time_at_level.len()];
        for (&(total, _), &prob) in &self.outcomes {
            totals[total as usize] += prob;
        }
        totals
    }

    /// Expected number of actions to reach the target
    pub fn expected_actions(&self) -> f64 {
        self.outcomes
            .iter()
            .map(|(&(_, actions), &prob)| actions as f64 * prob)
            .sum()
    }

    /// Expected final total
    pub fn expected_total(&self) -> f64 {
        self.outcomes
            .iter()
            .map(|(&(total, _), &prob)| total as f64 * prob)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn sum(values: impl IntoIterator<Item = f64>) -> f64 {
        values.into_iter().sum()
    }

    #[test]
    fn test_single_unit_gains() {
        let gains = GainDistribution::fixed(1).unwrap();
        let dist = ResourceDistribution::for_target(&gains, 5).unwrap();

        assert_eq!(dist.outcomes.len(), 1);
        assert!((dist.outcomes[&(5, 5)] - 1.0).abs() < 1e-12);

        let expected = [0.0, 1.0, 1.0, 1.0, 1.0, 2.0].map(|w| w / 6.0);
        for (level, (&got, want)) in dist.time_at_level.iter().zip(expected).enumerate() {
            assert!((got - want).abs() < 1e-12, "level {level}: {got} != {want}");
        }
        assert!((dist.expected_actions() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_clamps_at_ceiling() {
        let gains = GainDistribution::fixed(3).unwrap();
        let dist = ResourceDistribution::for_target(&gains, 4).unwrap();
        // 0 -> 3 -> 4 (clamped from 6)
        assert!((dist.outcomes[&(4, 2)] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ceiling_above_target() {
        let gains = GainDistribution::fixed(2).unwrap();
        let dist = ResourceDistribution::compute(&gains, 3, 5).unwrap();
        // 0 -> 2 -> 4, stops past the target without clamping
        assert!((dist.outcomes[&(4, 2)] - 1.0).abs() < 1e-12);
        assert_eq!(dist.time_at_level.len(), 6);
        assert!((dist.final_total_distribution()[4] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_mixed_gains() {
        let gains = GainDistribution::new(BTreeMap::from([(1, 0.5), (2, 0.5)])).unwrap();
        let dist = ResourceDistribution::for_target(&gains, 2).unwrap();
        // 2 in one action, or 1 then 1/2 (the second clamps to 2)
        assert!((dist.outcomes[&(2, 1)] - 0.5).abs() < 1e-12);
        assert!((dist.outcomes[&(2, 2)] - 0.5).abs() < 1e-12);
        assert!((dist.expected_actions() - 1.5).abs() < 1e-12);
        assert!((dist.average_gain - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_target_above_ceiling_is_unmodeled() {
        let gains = GainDistribution::fixed(1).unwrap();
        let err = ResourceDistribution::compute(&gains, 6, 5).unwrap_err();
        assert!(matches!(err, CalcError::UnmodeledInput(_)));
    }

    #[test]
    fn test_zero_target() {
        let gains = GainDistribution::fixed(1).unwrap();
        let dist = ResourceDistribution::for_target(&gains, 0).unwrap();
        assert!((dist.outcomes[&(0, 0)] - 1.0).abs() < f64::EPSILON);
        assert!((dist.time_at_level[0] - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_gain_tables() {
        let bad_sum = GainDistribution::new(BTreeMap::from([(1, 0.5), (2, 0.4)]));
        assert!(matches!(bad_sum, Err(CalcError::Configuration(_))));

        let negative = GainDistribution::new(BTreeMap::from([(1, 1.2), (2, -0.2)]));
        assert!(matches!(negative, Err(CalcError::Configuration(_))));

        let zero_gain = GainDistribution::new(BTreeMap::from([(0, 0.5), (1, 0.5)]));
        assert!(matches!(zero_gain, Err(CalcError::UnmodeledInput(_))));
    }

    #[test]
    fn test_gain_distribution_combines_chances() {
        let gains = gain_distribution(1, &[0.2, 0.0, 0.5]).unwrap();
        assert!((gains.probability(1) - 0.4).abs() < 1e-12);
        assert!((gains.probability(2) - 0.5).abs() < 1e-12);
        assert!((gains.probability(3) - 0.1).abs() < 1e-12);
        assert!((gains.mean() - 1.7).abs() < 1e-12);
    }

    #[test]
    fn test_gain_distribution_rejects_bad_chance() {
        assert!(gain_distribution(1, &[1.5]).is_err());
    }

    #[test]
    fn test_huge_gain_clamps_without_overflow() {
        let gains = GainDistribution::new(BTreeMap::from([(1, 0.5), (u32::MAX, 0.5)])).unwrap();
        let dist = ResourceDistribution::for_target(&gains, 5).unwrap();
        assert!((sum(dist.outcomes.values().copied()) - 1.0).abs() < 1e-12);
        assert!(dist.outcomes.keys().all(|&(total, _)| total == 5));
        // half of all sequences end on the first action
        assert!((dist.outcomes[&(5, 1)] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_extra_chance_on_max_gain_rejected() {
        let err = gain_distribution(u32::MAX, &[0.5]).unwrap_err();
        assert!(matches!(err, CalcError::Configuration(_)));
    }

    #[test]
    fn test_expected_total_above_target() {
        let gains = GainDistribution::new(BTreeMap::from([(1, 0.5), (2, 0.5)])).unwrap();
        let dist = ResourceDistribution::compute(&gains, 2, 3).unwrap();
        // overshoots to 3 only after 1 then 2
        assert!((dist.final_total_distribution()[3] - 0.25).abs() < 1e-12);
        assert!((dist.expected_total() - 2.25).abs() < 1e-12);

        let exact = ResourceDistribution::for_target(&GainDistribution::fixed(1).unwrap(), 5).unwrap();
        assert!((exact.expected_total() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_matches_monte_carlo() {
        let gains = gain_distribution(1, &[0.3, 0.25]).unwrap();
        let dist = ResourceDistribution::for_target(&gains, 5).unwrap();

        let table: Vec<(u32, f64)> = gains.iter().collect();
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let trials = 200_000;
        let mut counts: BTreeMap<(u32, u32), u32> = BTreeMap::new();
        for _ in 0..trials {
            let (mut total, mut actions) = (0u32, 0u32);
            while total < 5 {
                let roll: f64 = rng.gen();
                let mut acc = 0.0;
                let mut gain = table[table.len() - 1].0;
                for &(units, prob) in &table {
                    acc += prob;
                    if roll < acc {
                        gain = units;
                        break;
                    }
                }
                total = (total + gain).min(5);
                actions += 1;
            }
            *counts.entry((total, actions)).or_insert(0) += 1;
        }

        for (key, &prob) in &dist.outcomes {
            let observed = counts.get(key).copied().unwrap_or(0) as f64 / trials as f64;
            assert!(
                (observed - prob).abs() < 0.01,
                "{key:?}: analytic {prob}, sampled {observed}"
            );
        }
    }

    fn gain_table() -> impl Strategy<Value = GainDistribution> {
        prop::collection::vec(0.0f64..1.0, 0..4).prop_map(|chances| {
            gain_distribution(1, &chances).expect("chances are probabilities")
        })
    }

    proptest! {
        #[test]
        fn prop_outcomes_sum_to_one(gains in gain_table(), target in 1u32..=5, extra in 0u32..=3) {
            let dist = ResourceDistribution::compute(&gains, target, target + extra).unwrap();
            prop_assert!((sum(dist.outcomes.values().copied()) - 1.0).abs() < 1e-9);
            prop_assert!((sum(dist.time_at_level.iter().copied()) - 1.0).abs() < 1e-9);
        }

        #[test]
        fn prop_outcomes_reach_target(gains in gain_table(), target in 1u32..=5) {
            let dist = ResourceDistribution::for_target(&gains, target).unwrap();
            for &(total, actions) in dist.outcomes.keys() {
                prop_assert_eq!(total, target);
                prop_assert!(actions >= 1 && actions <= target);
            }
        }
    }
}
