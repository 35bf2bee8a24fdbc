//! Attack-rate and crit-rate tables produced by rotation models

use crate::types::AttackKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How often an ability is used
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rate {
    /// Events per second
    Scalar(f64),
    /// Events per second indexed by resource count at use
    PerResource(Vec<f64>),
}

impl Rate {
    /// Total events per second across all resource levels
    pub fn total(&self) -> f64 {
        match self {
            Rate::Scalar(rate) => *rate,
            Rate::PerResource(levels) => levels.iter().sum(),
        }
    }

    /// Whether every element is within `tolerance` of `other`
    ///
    /// A scalar never matches a sequence, and sequences of different
    /// lengths never match.
    pub fn is_close_to(&self, other: &Rate, tolerance: f64) -> bool {
        match (self, other) {
            (Rate::Scalar(a), Rate::Scalar(b)) => (a - b).abs() <= tolerance,
            (Rate::PerResource(a), Rate::PerResource(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(x, y)| (x - y).abs() <= tolerance)
            }
            _ => false,
        }
    }
}

/// One attack-rate entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackRate {
    pub kind: AttackKind,
    pub rate: Rate,
}

/// Ability key to rate of use
///
/// Ordered so that iteration (and therefore every sum built from it) is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttackRateTable {
    entries: BTreeMap<String, AttackRate>,
}

impl AttackRateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a scalar rate
    pub fn insert_scalar(&mut self, key: impl Into<String>, kind: AttackKind, rate: f64) {
        self.entries.insert(
            key.into(),
            AttackRate {
                kind,
                rate: Rate::Scalar(rate),
            },
        );
    }

    /// Set a per-resource-level rate
    pub fn insert_per_resource(
        &mut self,
        key: impl Into<String>,
        kind: AttackKind,
        levels: Vec<f64>,
    ) {
        self.entries.insert(
            key.into(),
            AttackRate {
                kind,
                rate: Rate::PerResource(levels),
            },
        );
    }

    /// Builder form of [`insert_scalar`](Self::insert_scalar)
    pub fn with_scalar(mut self, key: impl Into<String>, kind: AttackKind, rate: f64) -> Self {
        self.insert_scalar(key, kind, rate);
        self
    }

    /// Add to a scalar entry, creating it at zero if absent
    ///
    /// Returns false (and leaves the table untouched) when the key holds a
    /// per-resource rate.
    pub fn add_scalar(&mut self, key: &str, kind: AttackKind, rate: f64) -> bool {
        let entry = self.entries.entry(key.to_string()).or_insert(AttackRate {
            kind,
            rate: Rate::Scalar(0.0),
        });
        match &mut entry.rate {
            Rate::Scalar(existing) => {
                *existing += rate;
                true
            }
            Rate::PerResource(_) => false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&AttackRate> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Total rate of an entry, zero if absent
    pub fn total(&self, key: &str) -> f64 {
        self.entries.get(key).map(|e| e.rate.total()).unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttackRate)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Element-wise comparison against the previous iteration's table
    ///
    /// Every key in `self` must exist in `previous` with the same shape and
    /// every element must differ by at most `tolerance`.
    pub fn is_close_to(&self, previous: &AttackRateTable, tolerance: f64) -> bool {
        self.entries.iter().all(|(key, entry)| {
            previous
                .entries
                .get(key)
                .is_some_and(|old| entry.rate.is_close_to(&old.rate, tolerance))
        })
    }
}

/// Ability key to crit probability
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CritRateTable {
    rates: BTreeMap<String, f64>,
}

impl CritRateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a crit rate, capped to [0, 1]
    pub fn insert(&mut self, key: impl Into<String>, crit_rate: f64) {
        self.rates.insert(key.into(), crit_rate.clamp(0.0, 1.0));
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with(mut self, key: impl Into<String>, crit_rate: f64) -> Self {
        self.insert(key, crit_rate);
        self
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.rates.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.rates.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
