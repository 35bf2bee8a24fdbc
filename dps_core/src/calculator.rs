//! DPS calculator - resolve, aggregate, and stat weights

use crate::damage::{DamageAggregator, DamageBreakdown, DamageModel};
use crate::error::{CalcError, CalcResult};
use crate::procs::ProcDescriptor;
use crate::resolver::{Resolution, RotationModel, StatFixedPointResolver};
use crate::stat_block::StatVector;
use crate::types::Stat;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

/// Resolution and breakdown of one build
#[derive(Debug, Clone)]
pub struct DpsReport {
    pub resolution: Resolution,
    pub breakdown: DamageBreakdown,
}

impl DpsReport {
    pub fn total_dps(&self) -> f64 {
        self.breakdown.total_dps()
    }
}

/// DPS gained per point of each stat, normalized to attack power
#[derive(Debug, Clone, Serialize)]
pub struct StatWeights {
    /// DPS of the unmodified build
    pub base_dps: f64,
    /// Stat to weight, attack power = 1.0
    pub weights: BTreeMap<Stat, f64>,
}

impl StatWeights {
    pub fn get(&self, stat: Stat) -> f64 {
        self.weights.get(&stat).copied().unwrap_or(0.0)
    }
}

/// Runs the full pipeline for one rotation and damage model
pub struct DpsCalculator<'a> {
    resolver: StatFixedPointResolver<'a>,
    aggregator: DamageAggregator,
    /// Amount each stat is raised by when computing weights
    stat_delta: f64,
}

impl<'a> DpsCalculator<'a> {
    pub fn new(resolver: StatFixedPointResolver<'a>, aggregator: DamageAggregator) -> Self {
        DpsCalculator {
            resolver,
            aggregator,
            stat_delta: 1.0,
        }
    }

    /// Change the per-stat bump used by [`stat_weights`](Self::stat_weights)
    pub fn with_stat_delta(mut self, delta: f64) -> Self {
        self.stat_delta = delta;
        self
    }

    /// Resolve and aggregate one build
    pub fn report<R, M>(
        &self,
        base: StatVector,
        procs: Vec<ProcDescriptor>,
        rotation: &R,
        model: &M,
    ) -> CalcResult<DpsReport>
    where
        R: RotationModel + ?Sized,
        M: DamageModel + ?Sized,
    {
        let resolution = self.resolver.resolve(base, procs, rotation)?;
        let breakdown = self.aggregator.breakdown(&resolution, model)?;
        Ok(DpsReport {
            resolution,
            breakdown,
        })
    }

    /// Total DPS of one build
    pub fn dps<R, M>(
        &self,
        base: StatVector,
        procs: Vec<ProcDescriptor>,
        rotation: &R,
        model: &M,
    ) -> CalcResult<f64>
    where
        R: RotationModel + ?Sized,
        M: DamageModel + ?Sized,
    {
        Ok(self.report(base, procs, rotation, model)?.total_dps())
    }

    /// Stat weights by finite difference
    ///
    /// Every stat is raised by the configured delta and the build resolved
    /// again, one resolution per stat in parallel, each with its own copy of
    /// the procs. The DPS gains are divided by attack power's gain.
    pub fn stat_weights<R, M>(
        &self,
        base: StatVector,
        procs: &[ProcDescriptor],
        rotation: &R,
        model: &M,
    ) -> CalcResult<StatWeights>
    where
        R: RotationModel + Sync + ?Sized,
        M: DamageModel + Sync + ?Sized,
    {
        if !self.stat_delta.is_finite() || self.stat_delta <= 0.0 {
            return Err(CalcError::configuration(format!(
                "stat weight delta must be positive, got {}",
                self.stat_delta
            )));
        }

        let base_dps = self.dps(base, procs.to_vec(), rotation, model)?;

        let deltas: Vec<(Stat, f64)> = Stat::all()
            .par_iter()
            .map(|&stat| -> CalcResult<(Stat, f64)> {
                let bumped = base.with_bonus(stat, self.stat_delta);
                let dps = self.dps(bumped, procs.to_vec(), rotation, model)?;
                Ok((stat, dps - base_dps))
            })
            .collect::<CalcResult<_>>()?;

        let ap_delta = deltas
            .iter()
            .find(|(stat, _)| *stat == Stat::AttackPower)
            .map(|(_, delta)| *delta)
            .unwrap_or(0.0);
        if ap_delta == 0.0 {
            return Err(CalcError::unmodeled(
                "attack power has no effect on DPS; weights cannot be normalized",
            ));
        }

        let weights = deltas
            .into_iter()
            .map(|(stat, delta)| (stat, delta / ap_delta))
            .collect();
        tracing::debug!(base_dps, ap_delta, "computed stat weights");

        Ok(StatWeights { base_dps, weights })
    }
}
