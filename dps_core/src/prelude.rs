//! Prelude module for convenient imports
//!
//! ```rust
//! use dps_core::prelude::*;
//! ```

// Core types
pub use crate::stat_block::{RatingConversions, RatingTable, StatModifiers, StatVector};
pub use crate::types::{AttackKind, DamageCategory, Stat, TriggerCategory};
pub use crate::error::{CalcError, CalcResult};

// Rates
pub use crate::rates::{AttackRateTable, CritRateTable, Rate};

// Procs
pub use crate::procs::{ProcBehaviour, ProcDescriptor, ProcEffect, ProcRegistry, StatBonus};

// Resolution
pub use crate::resolver::{
    Convergence, Resolution, ResolverConfig, RotationModel, RotationOutput, StatFixedPointResolver,
};
pub use crate::combo::{gain_distribution, GainDistribution, ResourceDistribution};

// Damage
pub use crate::damage::{AbilityDamage, DamageAggregator, DamageBreakdown, DamageModel, DamageTuple};
pub use crate::defense::{ArmorConstants, HitBonuses, HitChances, HitTable, WeaponSetup};
pub use crate::calculator::{DpsCalculator, DpsReport, StatWeights};

// Config
pub use crate::config::{load_proc_configs, parse_proc_configs, CombatConstants};
