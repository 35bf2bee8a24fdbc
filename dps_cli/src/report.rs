//! Scenario report - JSON and plain text output

use crate::scenario::Scenario;
use dps_core::stat_block::DerivedStats;
use dps_core::{Convergence, DamageBreakdown, DpsReport, StatVector, StatWeights};
use serde::Serialize;
use std::fmt;

/// Resolved uptime of one stat proc
#[derive(Debug, Clone, Serialize)]
pub struct ProcUptime {
    pub name: String,
    pub uptime: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub total_dps: f64,
    pub convergence: Convergence,
    /// Final stats with proc contributions
    pub stats: StatVector,
    pub derived: DerivedStats,
    pub breakdown: DamageBreakdown,
    pub procs: Vec<ProcUptime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weights: Option<StatWeights>,
}

impl ScenarioReport {
    pub fn new(scenario: &Scenario, report: &DpsReport, weights: Option<StatWeights>) -> Self {
        let procs = report
            .resolution
            .procs
            .iter()
            .map(|proc| ProcUptime {
                name: proc.name.clone(),
                uptime: proc.uptime().unwrap_or(0.0),
            })
            .collect();
        let settings = &scenario.settings;
        let derived = report.resolution.stats.derive(
            &scenario.constants.ratings,
            settings.ap_per_agility,
            settings.agility_per_crit_percent,
        );
        ScenarioReport {
            name: scenario.name.clone(),
            total_dps: report.total_dps(),
            convergence: report.resolution.convergence,
            stats: report.resolution.stats,
            derived,
            breakdown: report.breakdown.clone(),
            procs,
            weights,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable summary, abilities sorted by DPS
    pub fn render_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {:.1} DPS", self.name, self.total_dps)?;
        match self.convergence {
            Convergence::Converged { iterations } => {
                writeln!(f, "converged after {iterations} iterations")?
            }
            Convergence::MaxIterationsReached { iterations } => {
                writeln!(f, "NOT converged after {iterations} iterations")?
            }
        }

        writeln!(f, "\nStats:")?;
        for (stat, value) in self.stats.iter() {
            writeln!(f, "  {stat:<16} {value:>10.1}")?;
        }
        writeln!(
            f,
            "  attack power {:.0}, haste x{:.3}, crit {:.2}%, mastery {:.2}",
            self.derived.attack_power,
            self.derived.haste_multiplier,
            self.derived.crit_chance * 100.0,
            self.derived.mastery
        )?;

        let mut abilities: Vec<_> = self.breakdown.iter().collect();
        abilities.sort_by(|a, b| b.1.average.total_cmp(&a.1.average));
        writeln!(f, "\nDamage:")?;
        for (name, contribution) in abilities {
            let share = if self.total_dps > 0.0 {
                contribution.average / self.total_dps * 100.0
            } else {
                0.0
            };
            writeln!(f, "  {name:<20} {:>10.1} ({share:>5.1}%)", contribution.average)?;
        }

        if !self.procs.is_empty() {
            writeln!(f, "\nProc uptimes:")?;
            for proc in &self.procs {
                writeln!(f, "  {:<20} {:>8.3}", proc.name, proc.uptime)?;
            }
        }

        if let Some(weights) = &self.weights {
            writeln!(f, "\nStat weights (attack power = 1.0):")?;
            for (stat, weight) in &weights.weights {
                writeln!(f, "  {stat:<16} {weight:>8.3}")?;
            }
        }
        Ok(())
    }
}
