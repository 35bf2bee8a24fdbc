//! dps_core - Analytical DPS estimation for character builds
//!
//! This library provides:
//! - StatFixedPointResolver: Solves the stat / proc uptime / attack rate loop
//! - ProcUptimeModel: Expected uptime of procs by archetype
//! - ResourceDistribution: Combo point distributions for builder sequences
//! - DamageAggregator: Per-ability DPS breakdown from resolved rates
//! - DpsCalculator: The full pipeline plus stat weights

pub mod calculator;
pub mod combo;
pub mod config;
pub mod damage;
pub mod defense;
pub mod error;
pub mod prelude;
pub mod procs;
pub mod rates;
pub mod resolver;
pub mod stat_block;
pub mod types;

// Re-export core types for convenience
pub use calculator::{DpsCalculator, DpsReport, StatWeights};
pub use combo::{gain_distribution, GainDistribution, ResourceDistribution};
pub use config::{CombatConstants, ConfigError};
pub use damage::{DamageAggregator, DamageBreakdown, DamageModel, DpsContribution};
pub use error::{CalcError, CalcResult};
pub use procs::{ProcDescriptor, ProcRegistry, ProcUptimeModel};
pub use rates::{AttackRateTable, CritRateTable, Rate};
pub use resolver::{Convergence, Resolution, RotationModel, StatFixedPointResolver};
pub use stat_block::{RatingConversions, RatingTable, StatModifiers, StatVector};
pub use types::{AttackKind, DamageCategory, Stat, TriggerCategory};
