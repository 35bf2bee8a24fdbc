//! dps_cli - Evaluate TOML scenarios with dps_core
//!
//! A scenario names a build, its abilities and procs. [`run`] resolves it
//! and produces a [`report::ScenarioReport`].

pub mod report;
pub mod rotation;
pub mod scenario;

use dps_core::config::ConfigError;
use dps_core::{CalcError, DpsCalculator, StatFixedPointResolver};
use report::ScenarioReport;
use rotation::ScenarioRotation;
use scenario::Scenario;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Calc(#[from] CalcError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid scenario: {0}")]
    Scenario(String),
}

/// Resolve a scenario, optionally with stat weights
pub fn run(scenario: &Scenario, weights: bool, stat_delta: f64) -> Result<ScenarioReport, CliError> {
    let conversions = &scenario.constants.ratings;
    let rotation = ScenarioRotation::new(scenario, conversions)?;

    let config = scenario.resolver_config();
    let aggregator = scenario.aggregator(config.hit_chances)?;
    let resolver = StatFixedPointResolver::new(config, conversions);
    let calculator = DpsCalculator::new(resolver, aggregator).with_stat_delta(stat_delta);

    tracing::info!(
        scenario = %scenario.name,
        procs = scenario.procs.len(),
        on_use = scenario.on_use.len(),
        "resolving scenario"
    );
    let report = calculator.report(scenario.stats, scenario.procs.clone(), &rotation, &rotation)?;
    if !report.resolution.convergence.is_converged() {
        tracing::warn!(
            scenario = %scenario.name,
            iterations = report.resolution.convergence.iterations(),
            "stats did not converge"
        );
    }

    let weights = if weights {
        Some(calculator.stat_weights(scenario.stats, &scenario.procs, &rotation, &rotation)?)
    } else {
        None
    };

    Ok(ScenarioReport::new(scenario, &report, weights))
}
