//! Damage aggregation - rates times expected damage per ability

use super::{DamageHits, DamageModel, DamageTuple};
use crate::defense::{ArmorConstants, HitChances};
use crate::error::{CalcError, CalcResult};
use crate::procs::{ProcDescriptor, ProcEffect};
use crate::rates::{AttackRateTable, CritRateTable, Rate};
use crate::resolver::Resolution;
use crate::stat_block::StatVector;
use crate::types::{AttackKind, DamageCategory};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// DPS of one ability, and the part of it that came from crits
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DpsContribution {
    pub average: f64,
    pub crit: f64,
}

impl std::ops::AddAssign for DpsContribution {
    fn add_assign(&mut self, other: Self) {
        self.average += other.average;
        self.crit += other.crit;
    }
}

/// Expected DPS of a hit used `rate` times per second
pub fn dps_contribution(damage: DamageTuple, crit_rate: f64, rate: f64) -> DpsContribution {
    let average_hit = damage.base * (1.0 - crit_rate) + damage.crit * crit_rate;
    DpsContribution {
        average: average_hit * rate,
        crit: damage.crit * crit_rate * rate,
    }
}

/// Ability key to DPS contribution
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DamageBreakdown {
    entries: BTreeMap<String, DpsContribution>,
}

impl DamageBreakdown {
    pub fn get(&self, key: &str) -> Option<&DpsContribution> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DpsContribution)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of every ability's average DPS
    pub fn total_dps(&self) -> f64 {
        self.entries.values().map(|c| c.average).sum()
    }

    fn insert(&mut self, key: &str, contribution: DpsContribution) {
        *self.entries.entry(key.to_string()).or_default() += contribution;
    }
}

/// Activated item or racial that deals damage once per cooldown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnUseDamage {
    pub name: String,
    pub category: DamageCategory,
    /// Damage per use before modifiers
    pub value: f64,
    /// Seconds between uses
    pub cooldown: f64,
}

/// Turns resolved rates into a per-ability DPS breakdown
#[derive(Debug, Clone)]
pub struct DamageAggregator {
    /// Fraction of physical damage that gets through the target's armor
    armor_multiplier: f64,
    hit_chances: HitChances,
    on_use: Vec<OnUseDamage>,
    /// Delay added to every on-use cooldown
    response_time: f64,
}

impl DamageAggregator {
    /// Aggregator against the target's base armor
    pub fn new(armor: &ArmorConstants) -> Self {
        Self::with_multiplier(armor.base_multiplier())
    }

    /// Aggregator against a specific armor value
    pub fn with_target_armor(armor: &ArmorConstants, target_armor: f64) -> Self {
        Self::with_multiplier(armor.mitigation_multiplier(target_armor))
    }

    fn with_multiplier(armor_multiplier: f64) -> Self {
        DamageAggregator {
            armor_multiplier,
            hit_chances: HitChances::default(),
            on_use: Vec::new(),
            response_time: 0.0,
        }
    }

    /// Hit chances applied to on-use damage
    pub fn with_hit_chances(mut self, hit_chances: HitChances) -> Self {
        self.hit_chances = hit_chances;
        self
    }

    /// Add on-use damage, each used every `cooldown + response_time` seconds
    pub fn with_on_use(mut self, on_use: Vec<OnUseDamage>, response_time: f64) -> CalcResult<Self> {
        if !response_time.is_finite() || response_time < 0.0 {
            return Err(CalcError::configuration(format!(
                "response time must be non-negative, got {response_time}"
            )));
        }
        for item in &on_use {
            let period = item.cooldown + response_time;
            if !period.is_finite() || period <= 0.0 || item.cooldown < 0.0 {
                return Err(CalcError::configuration(format!(
                    "on-use {} needs a positive cooldown, got {}",
                    item.name, item.cooldown
                )));
            }
        }
        self.on_use = on_use;
        self.response_time = response_time;
        Ok(self)
    }

    pub fn armor_multiplier(&self) -> f64 {
        self.armor_multiplier
    }

    pub fn on_use(&self) -> &[OnUseDamage] {
        &self.on_use
    }

    /// Breakdown of a resolution
    pub fn breakdown<M: DamageModel + ?Sized>(
        &self,
        resolution: &Resolution,
        model: &M,
    ) -> CalcResult<DamageBreakdown> {
        self.breakdown_parts(
            &resolution.stats,
            &resolution.attack_rates,
            &resolution.crit_rates,
            &resolution.damage_procs,
            model,
        )
    }

    /// Breakdown from the individual pieces of a resolution
    pub fn breakdown_parts<M: DamageModel + ?Sized>(
        &self,
        stats: &StatVector,
        attack_rates: &AttackRateTable,
        crit_rates: &CritRateTable,
        damage_procs: &[ProcDescriptor],
        model: &M,
    ) -> CalcResult<DamageBreakdown> {
        let mut breakdown = DamageBreakdown::default();

        for (key, entry) in attack_rates.iter() {
            if entry.kind == AttackKind::Proc || entry.rate.total() == 0.0 {
                continue;
            }
            let Some(damage) = model.ability_damage(key, stats) else {
                continue;
            };
            let mitigation = self.category_mitigation(damage.category);
            let crit_rate = crit_rates.get(key).unwrap_or(0.0);

            let contribution = match (&entry.rate, &damage.hits) {
                (Rate::Scalar(rate), DamageHits::Flat(hit)) => {
                    dps_contribution(hit.scaled(mitigation), crit_rate, *rate)
                }
                (Rate::PerResource(levels), DamageHits::Flat(hit)) => {
                    let rate: f64 = levels.iter().sum();
                    dps_contribution(hit.scaled(mitigation), crit_rate, rate)
                }
                (Rate::PerResource(levels), DamageHits::PerResource(hits)) => {
                    let mut total = DpsContribution::default();
                    for (level, &rate) in levels.iter().enumerate().skip(1) {
                        if rate == 0.0 {
                            continue;
                        }
                        let hit = hits.get(level).ok_or_else(|| {
                            CalcError::configuration(format!(
                                "{key} is used at resource level {level} but has no damage for it"
                            ))
                        })?;
                        total += dps_contribution(hit.scaled(mitigation), crit_rate, rate);
                    }
                    total
                }
                (Rate::Scalar(_), DamageHits::PerResource(_)) => {
                    return Err(CalcError::unmodeled(format!(
                        "{key} has per-resource damage but a single rate"
                    )));
                }
            };
            breakdown.insert(key, contribution);
        }

        // Procs sharing a name share one rate entry
        let mut seen = BTreeSet::new();
        for proc in damage_procs {
            if !seen.insert(proc.name.as_str()) {
                continue;
            }
            let ProcEffect::Damage { category, value } = proc.effect else {
                continue;
            };
            let rate = attack_rates.total(&proc.name);
            if rate == 0.0 {
                continue;
            }
            let crit_rate = if proc.can_crit {
                model.crit_rate(category, stats).clamp(0.0, 1.0)
            } else {
                0.0
            };
            breakdown.insert(
                &proc.name,
                self.proc_contribution(category, value, crit_rate, rate, model),
            );
        }

        for item in &self.on_use {
            let frequency = 1.0 / (item.cooldown + self.response_time);
            let rate = frequency * self.hit_chances.for_category(item.category);
            let crit_rate = model.crit_rate(item.category, stats).clamp(0.0, 1.0);
            breakdown.insert(
                &item.name,
                self.proc_contribution(item.category, item.value, crit_rate, rate, model),
            );
        }

        Ok(breakdown)
    }

    fn category_mitigation(&self, category: DamageCategory) -> f64 {
        match category {
            DamageCategory::Physical => self.armor_multiplier,
            DamageCategory::Spell | DamageCategory::MeleeSpell => 1.0,
        }
    }

    /// Damage-proc and on-use DPS; `rate` already includes the hit chance
    fn proc_contribution<M: DamageModel + ?Sized>(
        &self,
        category: DamageCategory,
        value: f64,
        crit_rate: f64,
        rate: f64,
        model: &M,
    ) -> DpsContribution {
        let crit_multiplier = model.crit_damage_multiplier();
        let average_hit =
            value * model.damage_multiplier(category) * self.category_mitigation(category);
        DpsContribution {
            average: average_hit * (1.0 + crit_rate * (crit_multiplier - 1.0)) * rate,
            crit: average_hit * crit_multiplier * crit_rate * rate,
        }
    }
}
