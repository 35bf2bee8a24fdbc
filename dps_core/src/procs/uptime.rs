//! Proc uptime model - expected uptime from trigger rates
//!
//! Uptime is measured in average active stacks, so a single-stack proc's
//! uptime is the fraction of the fight it is active. The formula is picked by
//! the proc's archetype:
//!
//! | archetype                       | formula                                  |
//! |---------------------------------|------------------------------------------|
//! | real PPM, 1 stack               | `K(1 - e^-λ)`                            |
//! | real PPM, stacks                | `K(e^λ - 1)(1 - (1 - e^-λ)^n)`           |
//! | real PPM, stacks of haste       | `K Σ base_s^s`, λ re-derived per stack   |
//! | real PPM with icd               | `K d / (60/(h ppm) + icd - 10)`          |
//! | triggered with icd              | `d / (icd + 1/pps)`                      |
//! | triggered, `pps >= 1`           | ramp-up approximation                    |
//! | triggered, `pps < 1`            | `P(1 - P^n)/Q`, `Q = (1 - pps)^d`        |

use super::{ProcDescriptor, ProcEffect};
use crate::error::{CalcError, CalcResult};
use crate::stat_block::RatingConversions;
use crate::types::Stat;

/// Bad-luck-protection correction applied to every real-PPM proc
pub const BAD_LUCK_CORRECTION: f64 = 1.1307;

/// Below this `Q` the geometric formula is numerically unreliable and the
/// ramp-up approximation is used instead
pub const RAMP_FALLBACK_THRESHOLD: f64 = 1e-4;

/// Haste inputs for real-PPM procs
pub struct HasteState<'a> {
    /// Haste multiplier from buffs and other non-rating sources
    pub static_haste: f64,
    /// Haste rating the proc rate is scaled by
    pub base_haste_rating: f64,
    pub conversions: &'a dyn RatingConversions,
}

impl<'a> HasteState<'a> {
    /// Total haste multiplier
    pub fn multiplier(&self) -> f64 {
        self.multiplier_with_bonus(0.0)
    }

    /// Total haste multiplier with extra haste rating on top of the base
    pub fn multiplier_with_bonus(&self, extra_rating: f64) -> f64 {
        self.static_haste
            * self
                .conversions
                .haste_multiplier(self.base_haste_rating + extra_rating)
    }
}

/// How often a proc gets its chance to fire
pub enum TriggerRate<'a> {
    /// Real-PPM procs: rate derives from haste
    Haste(&'a HasteState<'a>),
    /// Everything else: successful procs per second
    PerSecond(f64),
}

/// Computes expected uptimes and damage frequencies
#[derive(Debug, Clone, Copy)]
pub struct ProcUptimeModel {
    /// Fight length in seconds, used by the ramp-up approximation
    pub fight_duration: f64,
}

impl ProcUptimeModel {
    pub fn new(fight_duration: f64) -> Self {
        ProcUptimeModel { fight_duration }
    }

    /// Compute a proc's uptime and record it on the descriptor
    pub fn apply(&self, proc: &mut ProcDescriptor, trigger: TriggerRate<'_>) -> CalcResult<f64> {
        let uptime = self.compute_uptime(proc, trigger)?;
        proc.set_uptime(uptime);
        tracing::trace!(proc = %proc.name, uptime, "resolved proc uptime");
        Ok(uptime)
    }

    /// Expected uptime in average active stacks
    ///
    /// Results outside `[0, bound]` are reported as errors, never clamped.
    pub fn compute_uptime(&self, proc: &ProcDescriptor, trigger: TriggerRate<'_>) -> CalcResult<f64> {
        let behaviour = proc.behaviour();
        let stacks = proc.max_stacks;

        let uptime = match (behaviour.is_real_ppm(), trigger) {
            (true, TriggerRate::Haste(haste)) => {
                let ppm = real_ppm_rate(proc)?;
                match behaviour.icd {
                    Some(icd) => rppm_with_icd(proc, haste.multiplier() * ppm, icd)?,
                    None if stacks <= 1 => rppm_single(haste.multiplier() * ppm, proc.duration),
                    None if grants_haste(&proc.effect) => {
                        rppm_self_hasting(proc, haste, ppm)
                    }
                    None => rppm_stacking(haste.multiplier() * ppm, proc.duration, stacks),
                }
            }
            (false, TriggerRate::PerSecond(pps)) => match behaviour.icd {
                Some(icd) => triggered_with_icd(pps, proc.duration, icd),
                None if pps >= 1.0 => self.ramping_uptime(stacks, pps),
                None => self.geometric_uptime(pps, proc.duration, stacks),
            },
            (true, TriggerRate::PerSecond(_)) | (false, TriggerRate::Haste(_)) => {
                return Err(CalcError::configuration(format!(
                    "Invalid proc handling for proc {}",
                    proc.name
                )));
            }
        };

        check_bound(proc, uptime)
    }

    /// Damage-proc firings per second (before hit chance)
    pub fn damage_frequency(&self, proc: &ProcDescriptor, trigger: TriggerRate<'_>) -> CalcResult<f64> {
        let behaviour = proc.behaviour();
        match (behaviour.is_real_ppm(), trigger) {
            (true, TriggerRate::Haste(haste)) => {
                let ppm = real_ppm_rate(proc)?;
                Ok(haste.multiplier() * BAD_LUCK_CORRECTION * ppm / 60.0)
            }
            (false, TriggerRate::PerSecond(pps)) => match behaviour.icd {
                _ if pps <= 0.0 => Ok(0.0),
                Some(icd) => Ok(1.0 / (icd + 0.5 / pps)),
                None => Ok(pps),
            },
            _ => Err(CalcError::configuration(format!(
                "Invalid proc handling for proc {}",
                proc.name
            ))),
        }
    }

    /// Average stacks of a fast-triggering stacking proc
    ///
    /// Accounts for the part of the fight spent building up to full stacks.
    pub fn ramping_uptime(&self, max_stacks: u32, pps: f64) -> f64 {
        if pps <= 0.0 {
            return 0.0;
        }
        let stacks = max_stacks as f64;
        let time_for_one_stack = 1.0 / pps;
        if time_for_one_stack * stacks > self.fight_duration {
            let max_stacks_reached = self.fight_duration * pps;
            max_stacks_reached / 2.0
        } else {
            let missing_stacks = stacks * (stacks + 1.0) / 2.0;
            let stack_time_lost = missing_stacks * time_for_one_stack;
            stacks - stack_time_lost / self.fight_duration
        }
    }

    fn geometric_uptime(&self, pps: f64, duration: f64, max_stacks: u32) -> f64 {
        if pps <= 0.0 {
            return 0.0;
        }
        let q = 1.0 - pps;
        let big_q = q.powf(duration);
        if big_q < RAMP_FALLBACK_THRESHOLD {
            return self.ramping_uptime(max_stacks, pps);
        }
        let p = 1.0 - big_q;
        p * (1.0 - p.powi(max_stacks as i32)) / big_q
    }
}

fn real_ppm_rate(proc: &ProcDescriptor) -> CalcResult<f64> {
    match proc.behaviour().archetype {
        super::ProcArchetype::RealPpm { ppm } => Ok(ppm),
        _ => Err(CalcError::configuration(format!(
            "Invalid proc handling for proc {}",
            proc.name
        ))),
    }
}

fn grants_haste(effect: &ProcEffect) -> bool {
    matches!(
        effect,
        ProcEffect::Stat {
            stat: Stat::HasteRating,
            ..
        }
    )
}

fn rppm_lambda(hasted_ppm: f64, duration: f64) -> f64 {
    hasted_ppm * duration / 60.0
}

fn rppm_single(hasted_ppm: f64, duration: f64) -> f64 {
    let lambda = rppm_lambda(hasted_ppm, duration);
    BAD_LUCK_CORRECTION * -(-lambda).exp_m1()
}

/// `K(e^λ - 1)(1 - (1 - e^-λ)^n)`, evaluated as the equal sum
/// `K Σ_{s=1..n} (1 - e^-λ)^s` which stays finite for large λ
fn rppm_stacking(hasted_ppm: f64, duration: f64, max_stacks: u32) -> f64 {
    let lambda = rppm_lambda(hasted_ppm, duration);
    let base = -(-lambda).exp_m1();
    let sum: f64 = (1..=max_stacks).map(|stack| base.powi(stack as i32)).sum();
    BAD_LUCK_CORRECTION * sum
}

/// Stacking haste proc: every stack raises the chance of the next one
fn rppm_self_hasting(proc: &ProcDescriptor, haste: &HasteState<'_>, ppm: f64) -> f64 {
    let value = match proc.effect {
        ProcEffect::Stat { value, .. } => value,
        _ => 0.0,
    };
    let max_stacks = proc.max_stacks;
    let mut uptime = 0.0;
    for stack in 1..=max_stacks {
        // The top stack refreshes itself, so use the midpoint of (max - 1, max)
        let stack_size = if stack == max_stacks {
            stack as f64 - 0.5
        } else {
            stack as f64 - 1.0
        };
        let hasted_ppm = haste.multiplier_with_bonus(value * stack_size) * ppm;
        let lambda = rppm_lambda(hasted_ppm, proc.duration);
        let base = -(-lambda).exp_m1();
        uptime += base.powi(stack as i32);
    }
    BAD_LUCK_CORRECTION * uptime
}

fn rppm_with_icd(proc: &ProcDescriptor, hasted_ppm: f64, icd: f64) -> CalcResult<f64> {
    if hasted_ppm <= 0.0 {
        return Ok(0.0);
    }
    let mean_proc_time = 60.0 / hasted_ppm + icd - 10.0;
    if mean_proc_time <= 0.0 {
        return Err(CalcError::unmodeled(format!(
            "proc {} has a non-positive mean time between procs ({mean_proc_time:.3}s)",
            proc.name
        )));
    }
    Ok(BAD_LUCK_CORRECTION * proc.duration / mean_proc_time)
}

fn triggered_with_icd(pps: f64, duration: f64, icd: f64) -> f64 {
    if pps <= 0.0 {
        return 0.0;
    }
    duration / (icd + 1.0 / pps)
}

fn check_bound(proc: &ProcDescriptor, uptime: f64) -> CalcResult<f64> {
    let mut bound = proc.max_stacks as f64;
    if proc.behaviour().is_real_ppm() {
        bound *= BAD_LUCK_CORRECTION;
    }
    if !uptime.is_finite() || uptime < 0.0 || uptime > bound {
        return Err(CalcError::UptimeOutOfRange {
            proc_name: proc.name.clone(),
            uptime,
            bound,
        });
    }
    Ok(uptime)
}
