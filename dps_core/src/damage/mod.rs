//! Damage system - DamageModel and per-ability DPS aggregation

mod aggregator;
mod model;

pub use aggregator::{
    dps_contribution, DamageAggregator, DamageBreakdown, DpsContribution, OnUseDamage,
};
pub use model::{AbilityDamage, DamageHits, DamageModel, DamageTuple};
