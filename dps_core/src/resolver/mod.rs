//! Stat fixed-point resolution
//!
//! Stats depend on proc uptimes, proc uptimes depend on attack rates, and
//! attack rates depend on stats. The resolver iterates the rotation model
//! until its attack rates stop moving, then applies the procs that are too
//! slow to feed back (internal cooldown procs) and appends damage procs.

use crate::config::ResolverConstants;
use crate::defense::HitChances;
use crate::error::{CalcError, CalcResult};
use crate::procs::{
    procs_per_second, HasteState, ProcDescriptor, ProcEffect, ProcUptimeModel, TriggerRate,
};
use crate::rates::{AttackRateTable, CritRateTable};
use crate::stat_block::{RatingConversions, StatModifiers, StatVector};
use crate::types::AttackKind;
use serde::{Deserialize, Serialize};

/// Attack and crit rates produced by a rotation model
pub type RotationOutput = (AttackRateTable, CritRateTable);

/// Specialization-specific rotation formulas
///
/// Maps a stat vector to how often every ability is used and how often it
/// crits. Errors are passed through the resolver unchanged.
pub trait RotationModel {
    fn attack_rates(&self, stats: &StatVector) -> CalcResult<RotationOutput>;
}

impl<F> RotationModel for F
where
    F: Fn(&StatVector) -> CalcResult<RotationOutput>,
{
    fn attack_rates(&self, stats: &StatVector) -> CalcResult<RotationOutput> {
        self(stats)
    }
}

/// Resolver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    pub max_iterations: u32,
    pub tolerance: f64,
    pub fight_duration: f64,
    /// Haste multiplier from sources other than rating
    pub static_haste: f64,
    pub hit_chances: HitChances,
    pub modifiers: StatModifiers,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::from_constants(&ResolverConstants::default())
    }
}

impl ResolverConfig {
    pub fn from_constants(constants: &ResolverConstants) -> Self {
        ResolverConfig {
            max_iterations: constants.max_iterations,
            tolerance: constants.tolerance,
            fight_duration: constants.fight_duration,
            static_haste: 1.0,
            hit_chances: HitChances::default(),
            modifiers: StatModifiers::default(),
        }
    }
}

/// How the iteration ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Convergence {
    Converged { iterations: u32 },
    MaxIterationsReached { iterations: u32 },
}

impl Convergence {
    pub fn is_converged(&self) -> bool {
        matches!(self, Convergence::Converged { .. })
    }

    pub fn iterations(&self) -> u32 {
        match *self {
            Convergence::Converged { iterations } | Convergence::MaxIterationsReached { iterations } => {
                iterations
            }
        }
    }
}

/// Output of a resolution
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Final stats including every proc contribution
    pub stats: StatVector,
    /// Final attack rates, damage-proc entries included
    pub attack_rates: AttackRateTable,
    pub crit_rates: CritRateTable,
    /// Stat procs with their resolved uptimes
    pub procs: Vec<ProcDescriptor>,
    /// Damage procs, whose rates are in `attack_rates` under their names
    pub damage_procs: Vec<ProcDescriptor>,
    pub convergence: Convergence,
}

/// Fixed-point solver for the stat / uptime / attack-rate loop
pub struct StatFixedPointResolver<'a> {
    config: ResolverConfig,
    conversions: &'a dyn RatingConversions,
    uptime_model: ProcUptimeModel,
}

impl<'a> StatFixedPointResolver<'a> {
    pub fn new(config: ResolverConfig, conversions: &'a dyn RatingConversions) -> Self {
        let uptime_model = ProcUptimeModel::new(config.fight_duration);
        StatFixedPointResolver {
            config,
            conversions,
            uptime_model,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve a build
    ///
    /// Takes ownership of the proc descriptors: their uptimes are written
    /// during resolution and returned in the [`Resolution`].
    pub fn resolve<R: RotationModel + ?Sized>(
        &self,
        base: StatVector,
        procs: Vec<ProcDescriptor>,
        rotation: &R,
    ) -> CalcResult<Resolution> {
        for proc in &procs {
            proc.validate()?;
        }
        let (damage_procs, mut stat_procs): (Vec<_>, Vec<_>) =
            procs.into_iter().partition(|p| p.is_damage_proc());

        let working_base = base.scaled_by(&self.config.modifiers);
        let haste = HasteState {
            static_haste: self.config.static_haste,
            base_haste_rating: base.haste_rating,
            conversions: self.conversions,
        };

        tracing::debug!(
            stat_procs = stat_procs.len(),
            damage_procs = damage_procs.len(),
            "seeding attack rates from base stats"
        );
        let (mut attack_rates, mut crit_rates) = rotation.attack_rates(&working_base)?;

        let mut stats = working_base;
        let mut convergence = Convergence::MaxIterationsReached {
            iterations: self.config.max_iterations,
        };

        for iteration in 1..=self.config.max_iterations {
            stats = working_base;

            let mut triggers = attack_rates.clone();
            for proc in damage_procs.iter().filter(|p| !p.has_icd()) {
                self.add_damage_proc(proc, &mut triggers, &crit_rates, &haste)?;
            }

            for proc in stat_procs.iter_mut().filter(|p| !p.has_icd()) {
                let trigger = self.trigger_rate(proc, &triggers, &crit_rates, &haste)?;
                self.uptime_model.apply(proc, trigger)?;
                self.add_contribution(&mut stats, proc);
            }

            let (new_rates, new_crits) = rotation.attack_rates(&stats)?;
            let converged = new_rates.is_close_to(&attack_rates, self.config.tolerance);
            attack_rates = new_rates;
            crit_rates = new_crits;

            tracing::debug!(iteration, converged, "stat resolution iteration");
            if converged {
                convergence = Convergence::Converged {
                    iterations: iteration,
                };
                break;
            }
        }

        if !convergence.is_converged() {
            tracing::warn!(
                max_iterations = self.config.max_iterations,
                tolerance = self.config.tolerance,
                "attack rates did not converge; using last iteration"
            );
        }

        tracing::debug!("applying internal cooldown procs");
        for proc in stat_procs.iter_mut().filter(|p| p.has_icd()) {
            let trigger = self.trigger_rate(proc, &attack_rates, &crit_rates, &haste)?;
            self.uptime_model.apply(proc, trigger)?;
            self.add_contribution(&mut stats, proc);
        }

        let (mut attack_rates, crit_rates) = rotation.attack_rates(&stats)?;
        for proc in &damage_procs {
            self.add_damage_proc(proc, &mut attack_rates, &crit_rates, &haste)?;
        }

        Ok(Resolution {
            stats,
            attack_rates,
            crit_rates,
            procs: stat_procs,
            damage_procs,
            convergence,
        })
    }

    fn trigger_rate<'h>(
        &self,
        proc: &ProcDescriptor,
        attack_rates: &AttackRateTable,
        crit_rates: &CritRateTable,
        haste: &'h HasteState<'h>,
    ) -> CalcResult<TriggerRate<'h>> {
        if proc.behaviour().is_real_ppm() {
            Ok(TriggerRate::Haste(haste))
        } else {
            Ok(TriggerRate::PerSecond(procs_per_second(
                proc,
                attack_rates,
                crit_rates,
            )?))
        }
    }

    /// Add `frequency * hit_chance` for a damage proc to `attack_rates`
    fn add_damage_proc(
        &self,
        proc: &ProcDescriptor,
        attack_rates: &mut AttackRateTable,
        crit_rates: &CritRateTable,
        haste: &HasteState<'_>,
    ) -> CalcResult<()> {
        let ProcEffect::Damage { category, .. } = proc.effect else {
            return Ok(());
        };
        let trigger = self.trigger_rate(proc, attack_rates, crit_rates, haste)?;
        let frequency = self.uptime_model.damage_frequency(proc, trigger)?;
        let rate = frequency * self.config.hit_chances.for_category(category);

        if !attack_rates.add_scalar(&proc.name, AttackKind::Proc, rate) {
            return Err(CalcError::configuration(format!(
                "Damage proc {} collides with a per-resource ability",
                proc.name
            )));
        }
        tracing::trace!(proc = %proc.name, rate, "damage proc rate");
        Ok(())
    }

    fn add_contribution(&self, stats: &mut StatVector, proc: &ProcDescriptor) {
        let uptime = proc.uptime().unwrap_or(0.0);
        for bonus in proc.effect.stat_bonuses() {
            let modifier = self.config.modifiers.get(bonus.stat);
            stats.add(bonus.stat, uptime * bonus.value * modifier);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procs::ProcBehaviour;
    use crate::stat_block::RatingTable;
    use crate::types::{DamageCategory, Stat, TriggerCategory};
    use std::cell::Cell;

    fn constant_rotation(_stats: &StatVector) -> CalcResult<RotationOutput> {
        let rates = AttackRateTable::new()
            .with_scalar("mh_autoattack", AttackKind::AutoAttack, 0.8)
            .with_scalar("sinister_strike", AttackKind::Strike, 0.5);
        let crits = CritRateTable::new()
            .with("mh_autoattack", 0.25)
            .with("sinister_strike", 0.3);
        Ok((rates, crits))
    }

    /// Auto attack speed grows with haste rating
    fn hasted_rotation(stats: &StatVector) -> CalcResult<RotationOutput> {
        let table = RatingTable::default();
        let speed = 0.8 * table.haste_multiplier(stats.haste_rating);
        let rates = AttackRateTable::new().with_scalar("mh_autoattack", AttackKind::AutoAttack, speed);
        let crits = CritRateTable::new().with("mh_autoattack", 0.2);
        Ok((rates, crits))
    }

    fn resolver(table: &RatingTable) -> StatFixedPointResolver<'_> {
        StatFixedPointResolver::new(ResolverConfig::default(), table)
    }

    fn agility_proc() -> ProcDescriptor {
        ProcDescriptor::new(
            "dancing_steel",
            ProcEffect::Stat {
                stat: Stat::Agility,
                value: 1650.0,
            },
            12.0,
            ProcBehaviour::real_ppm(2.53, TriggerCategory::AllAttacks),
        )
    }

    #[test]
    fn test_constant_rotation_converges_immediately() {
        let table = RatingTable::default();
        let resolution = resolver(&table)
            .resolve(StatVector::default(), vec![agility_proc()], &constant_rotation)
            .unwrap();

        assert_eq!(resolution.convergence, Convergence::Converged { iterations: 1 });
        let (expected, _) = constant_rotation(&StatVector::default()).unwrap();
        assert_eq!(resolution.attack_rates, expected);
    }

    #[test]
    fn test_stat_proc_contribution() {
        let table = RatingTable::default();
        let base = StatVector {
            agility: 10000.0,
            ..Default::default()
        };
        let resolution = resolver(&table)
            .resolve(base, vec![agility_proc()], &constant_rotation)
            .unwrap();

        let uptime = resolution.procs[0].uptime().unwrap();
        assert!(uptime > 0.0 && uptime < 1.0);
        assert!((resolution.stats.agility - (10000.0 + uptime * 1650.0)).abs() < 1e-9);
    }

    #[test]
    fn test_modifiers_apply_to_base_and_procs() {
        let table = RatingTable::default();
        let config = ResolverConfig {
            modifiers: StatModifiers {
                agility: 1.1,
                ..Default::default()
            },
            ..Default::default()
        };
        let base = StatVector {
            agility: 10000.0,
            ..Default::default()
        };
        let resolution = StatFixedPointResolver::new(config, &table)
            .resolve(base, vec![agility_proc()], &constant_rotation)
            .unwrap();

        let uptime = resolution.procs[0].uptime().unwrap();
        let expected = 11000.0 + uptime * 1650.0 * 1.1;
        assert!((resolution.stats.agility - expected).abs() < 1e-9);
    }

    fn nudged_rotation(
        calls: &Cell<u32>,
        nudge: f64,
    ) -> impl Fn(&StatVector) -> CalcResult<RotationOutput> + '_ {
        move |_stats: &StatVector| -> CalcResult<RotationOutput> {
            let call = calls.get();
            calls.set(call + 1);
            let rate = if call == 0 { 1.0 } else { 1.0 + nudge };
            let rates = AttackRateTable::new().with_scalar("sinister_strike", AttackKind::Strike, rate);
            Ok((rates, CritRateTable::new()))
        }
    }

    #[test]
    fn test_change_above_tolerance_keeps_iterating() {
        let table = RatingTable::default();
        let calls = Cell::new(0);
        let rotation = nudged_rotation(&calls, 2e-7);
        let resolution = resolver(&table)
            .resolve(StatVector::default(), Vec::new(), &rotation)
            .unwrap();
        assert_eq!(resolution.convergence, Convergence::Converged { iterations: 2 });
    }

    #[test]
    fn test_change_below_tolerance_converges() {
        let table = RatingTable::default();
        let calls = Cell::new(0);
        let rotation = nudged_rotation(&calls, 5e-8);
        let resolution = resolver(&table)
            .resolve(StatVector::default(), Vec::new(), &rotation)
            .unwrap();
        assert_eq!(resolution.convergence, Convergence::Converged { iterations: 1 });
    }

    #[test]
    fn test_oscillation_reports_max_iterations() {
        let table = RatingTable::default();
        let config = ResolverConfig {
            max_iterations: 3,
            ..Default::default()
        };
        let calls = Cell::new(0u32);
        let rotation = |_stats: &StatVector| -> CalcResult<RotationOutput> {
            let call = calls.get();
            calls.set(call + 1);
            let rate = if call % 2 == 0 { 1.0 } else { 2.0 };
            let rates = AttackRateTable::new().with_scalar("sinister_strike", AttackKind::Strike, rate);
            Ok((rates, CritRateTable::new()))
        };

        let resolution = StatFixedPointResolver::new(config, &table)
            .resolve(StatVector::default(), Vec::new(), &rotation)
            .unwrap();
        assert_eq!(
            resolution.convergence,
            Convergence::MaxIterationsReached { iterations: 3 }
        );
        // seed + 3 iterations + finalize
        assert_eq!(calls.get(), 5);
    }

    #[test]
    fn test_rotation_error_propagates() {
        let table = RatingTable::default();
        let rotation = |_stats: &StatVector| -> CalcResult<RotationOutput> {
            Err(CalcError::Rotation("no finisher configured".to_string()))
        };
        let err = resolver(&table)
            .resolve(StatVector::default(), Vec::new(), &rotation)
            .unwrap_err();
        assert!(matches!(err, CalcError::Rotation(msg) if msg == "no finisher configured"));
    }

    #[test]
    fn test_haste_proc_feeds_back() {
        let table = RatingTable::default();
        let haste_proc = ProcDescriptor::new(
            "haste_trinket",
            ProcEffect::Stat {
                stat: Stat::HasteRating,
                value: 4000.0,
            },
            10.0,
            ProcBehaviour::chance(0.1, TriggerCategory::AutoAttacks),
        );
        let resolution = resolver(&table)
            .resolve(StatVector::default(), vec![haste_proc], &hasted_rotation)
            .unwrap();

        assert!(resolution.convergence.is_converged());
        assert!(resolution.convergence.iterations() > 1);
        assert!(resolution.stats.haste_rating > 0.0);
        assert!(resolution.attack_rates.total("mh_autoattack") > 0.8);
    }

    #[test]
    fn test_icd_proc_applied_once_after_convergence() {
        let table = RatingTable::default();
        let icd_proc = ProcDescriptor::new(
            "terror",
            ProcEffect::Stat {
                stat: Stat::Agility,
                value: 1000.0,
            },
            20.0,
            ProcBehaviour::chance(0.15, TriggerCategory::Strikes).with_icd(115.0),
        );
        let resolution = resolver(&table)
            .resolve(StatVector::default(), vec![icd_proc], &constant_rotation)
            .unwrap();

        // 0.5 strikes/s * 0.15 = 0.075 pps
        let expected_uptime = 20.0 / (115.0 + 1.0 / 0.075);
        let uptime = resolution.procs[0].uptime().unwrap();
        assert!((uptime - expected_uptime).abs() < 1e-12);
        assert!((resolution.stats.agility - uptime * 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_damage_proc_entries_added_with_hit_chance() {
        let table = RatingTable::default();
        let config = ResolverConfig {
            hit_chances: HitChances {
                strike: 0.9,
                spell: 0.8,
            },
            ..Default::default()
        };
        let bolt = ProcDescriptor::new(
            "lightning_bolt",
            ProcEffect::Damage {
                category: DamageCategory::Spell,
                value: 2000.0,
            },
            1.0,
            ProcBehaviour::chance(0.2, TriggerCategory::Strikes),
        );
        let cut = ProcDescriptor::new(
            "bleeding_cut",
            ProcEffect::Damage {
                category: DamageCategory::Physical,
                value: 500.0,
            },
            1.0,
            ProcBehaviour::chance(0.5, TriggerCategory::Strikes).with_icd(4.0),
        );

        let resolution = StatFixedPointResolver::new(config, &table)
            .resolve(StatVector::default(), vec![bolt, cut], &constant_rotation)
            .unwrap();

        let bolt_rate = resolution.attack_rates.total("lightning_bolt");
        assert!((bolt_rate - 0.5 * 0.2 * 0.8).abs() < 1e-12);

        // pps 0.25: 1 / (4 + 0.5 / 0.25)
        let cut_rate = resolution.attack_rates.total("bleeding_cut");
        assert!((cut_rate - 0.9 / 6.0).abs() < 1e-12);

        assert_eq!(resolution.damage_procs.len(), 2);
        assert!(resolution.procs.is_empty());
        assert_eq!(
            resolution.attack_rates.get("lightning_bolt").unwrap().kind,
            AttackKind::Proc
        );
    }

    #[test]
    fn test_invalid_proc_rejected_before_rotation() {
        let table = RatingTable::default();
        let calls = Cell::new(0);
        let rotation = nudged_rotation(&calls, 0.0);
        let broken = ProcDescriptor::new(
            "broken",
            ProcEffect::Stat {
                stat: Stat::Agility,
                value: 100.0,
            },
            -1.0,
            ProcBehaviour::chance(0.1, TriggerCategory::Strikes),
        );
        let err = resolver(&table)
            .resolve(StatVector::default(), vec![broken], &rotation)
            .unwrap_err();
        assert!(matches!(err, CalcError::Configuration(_)));
        assert_eq!(calls.get(), 0);
    }
}
