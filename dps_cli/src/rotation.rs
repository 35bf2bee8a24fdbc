//! Scenario rotation - fixed-rate abilities plus a builder/finisher cycle

use crate::scenario::{AbilitySpec, FinisherSpec, Scenario};
use dps_core::combo::{gain_distribution, ResourceDistribution};
use dps_core::damage::{AbilityDamage, DamageModel, DamageTuple};
use dps_core::resolver::{RotationModel, RotationOutput};
use dps_core::{
    AttackKind, AttackRateTable, CalcError, CalcResult, CritRateTable, DamageCategory,
    RatingConversions, StatVector,
};

/// Finisher cycle: one finisher per full builder sequence
#[derive(Debug, Clone)]
struct FinisherCycle {
    spec: FinisherSpec,
    /// Probability of spending at each resource level
    spend_distribution: Vec<f64>,
    /// Builder uses per finisher
    builders_per_finisher: f64,
}

/// Rotation and damage formulas described by a [`Scenario`]
pub struct ScenarioRotation<'a> {
    scenario: &'a Scenario,
    conversions: &'a dyn RatingConversions,
    finisher: Option<FinisherCycle>,
}

impl<'a> ScenarioRotation<'a> {
    pub fn new(scenario: &'a Scenario, conversions: &'a dyn RatingConversions) -> CalcResult<Self> {
        let finisher = match &scenario.finisher {
            Some(spec) => {
                let gains = gain_distribution(spec.base_gain, &spec.extra_gain_chances)?;
                let distribution = ResourceDistribution::compute(&gains, spec.target, spec.ceiling())?;
                let builders_per_finisher = distribution.expected_actions();
                if !builders_per_finisher.is_finite() || builders_per_finisher <= 0.0 {
                    return Err(CalcError::unmodeled(format!(
                        "finisher {} is used without any builder uses",
                        spec.name
                    )));
                }
                tracing::debug!(
                    finisher = %spec.name,
                    builders_per_finisher,
                    points_per_finisher = distribution.expected_total(),
                    average_gain = distribution.average_gain,
                    "finisher cycle"
                );
                Some(FinisherCycle {
                    spec: spec.clone(),
                    spend_distribution: distribution.final_total_distribution(),
                    builders_per_finisher,
                })
            }
            None => None,
        };
        Ok(ScenarioRotation {
            scenario,
            conversions,
            finisher,
        })
    }

    fn haste(&self, stats: &StatVector) -> f64 {
        self.scenario.settings.static_haste * self.conversions.haste_multiplier(stats.haste_rating)
    }

    fn melee_crit(&self, stats: &StatVector) -> f64 {
        self.scenario.settings.base_crit
            + stats.crit_chance(self.conversions, self.scenario.settings.agility_per_crit_percent)
    }

    fn spell_crit(&self, stats: &StatVector) -> f64 {
        self.scenario.settings.base_crit + self.conversions.crit_chance(stats.crit_rating)
    }

    fn attack_power(&self, stats: &StatVector) -> f64 {
        stats.effective_attack_power(self.scenario.settings.ap_per_agility)
    }

    fn ability_rate(&self, ability: &AbilitySpec, haste: f64) -> f64 {
        if ability.hasted {
            ability.rate * haste
        } else {
            ability.rate
        }
    }

    fn hit(&self, damage: f64) -> DamageTuple {
        DamageTuple::with_crit_multiplier(damage, self.scenario.settings.crit_damage_multiplier)
    }
}

impl RotationModel for ScenarioRotation<'_> {
    fn attack_rates(&self, stats: &StatVector) -> CalcResult<RotationOutput> {
        let haste = self.haste(stats);
        let mut rates = AttackRateTable::new();
        let mut crits = CritRateTable::new();

        for ability in &self.scenario.abilities {
            rates.insert_scalar(&ability.name, ability.kind, self.ability_rate(ability, haste));
            let crit = match ability.kind {
                AttackKind::DebuffApplication => 0.0,
                _ => self.crit_rate(ability.category, stats),
            };
            crits.insert(&ability.name, crit);
        }

        if let Some(cycle) = &self.finisher {
            let builder = self.scenario.ability(&cycle.spec.builder).ok_or_else(|| {
                CalcError::Rotation(format!("unknown builder '{}'", cycle.spec.builder))
            })?;
            let finishers_per_second =
                self.ability_rate(builder, haste) / cycle.builders_per_finisher;
            let per_level = cycle
                .spend_distribution
                .iter()
                .map(|p| p * finishers_per_second)
                .collect();
            rates.insert_per_resource(&cycle.spec.name, AttackKind::Finisher, per_level);
            crits.insert(&cycle.spec.name, self.crit_rate(cycle.spec.category, stats));
        }

        Ok((rates, crits))
    }
}

impl DamageModel for ScenarioRotation<'_> {
    fn ability_damage(&self, key: &str, stats: &StatVector) -> Option<AbilityDamage> {
        let ap = self.attack_power(stats);

        if let Some(cycle) = self.finisher.as_ref().filter(|c| c.spec.name == key) {
            let spec = &cycle.spec;
            let per_point = spec.damage_per_point + spec.ap_coefficient_per_point * ap;
            let hits = (0..=spec.ceiling())
                .map(|points| self.hit(per_point * points as f64))
                .collect();
            return Some(AbilityDamage::per_resource(spec.category, hits));
        }

        let ability = self.scenario.ability(key)?;
        if !ability.deals_damage() {
            return None;
        }
        let damage = ability.damage + ability.ap_coefficient * ap;
        Some(AbilityDamage::flat(ability.category, self.hit(damage)))
    }

    fn crit_rate(&self, category: DamageCategory, stats: &StatVector) -> f64 {
        match category {
            DamageCategory::Spell => self.spell_crit(stats),
            DamageCategory::Physical | DamageCategory::MeleeSpell => self.melee_crit(stats),
        }
    }

    fn crit_damage_multiplier(&self) -> f64 {
        self.scenario.settings.crit_damage_multiplier
    }
}
