//! Proc system - descriptors, trigger rates and uptime formulas

mod behaviour;
pub mod trigger;
mod types;
pub mod uptime;

pub use behaviour::{ProcArchetype, ProcBehaviour, RawBehaviour};
pub use trigger::procs_per_second;
pub use types::{ProcDescriptor, ProcEffect, RawProc, StatBonus, DEFAULT_BEHAVIOUR};
pub use uptime::{HasteState, ProcUptimeModel, TriggerRate, BAD_LUCK_CORRECTION};

use std::collections::BTreeMap;

/// Named proc templates
///
/// The registry holds unresolved templates; [`instantiate`](Self::instantiate)
/// hands out fresh copies so every resolution writes its own uptimes.
#[derive(Debug, Clone, Default)]
pub struct ProcRegistry {
    procs: BTreeMap<String, ProcDescriptor>,
}

impl ProcRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        ProcRegistry {
            procs: BTreeMap::new(),
        }
    }

    /// Register a proc, replacing any proc with the same name
    pub fn register(&mut self, proc: ProcDescriptor) {
        self.procs.insert(proc.name.clone(), proc);
    }

    /// Get a proc template by name
    pub fn get(&self, name: &str) -> Option<&ProcDescriptor> {
        self.procs.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProcDescriptor> {
        self.procs.values()
    }

    pub fn len(&self) -> usize {
        self.procs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procs.is_empty()
    }

    /// Fresh copies of the named procs, in the order given
    ///
    /// Unknown names are a configuration error.
    pub fn instantiate<S: AsRef<str>>(&self, names: &[S]) -> crate::CalcResult<Vec<ProcDescriptor>> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.procs.get(name).cloned().ok_or_else(|| {
                    crate::CalcError::configuration(format!("Unknown proc '{name}'"))
                })
            })
            .collect()
    }

    /// Fresh copies of every registered proc
    pub fn instantiate_all(&self) -> Vec<ProcDescriptor> {
        self.procs.values().cloned().collect()
    }

    /// Procs that grant stats
    pub fn stat_procs(&self) -> impl Iterator<Item = &ProcDescriptor> {
        self.procs.values().filter(|p| !p.is_damage_proc())
    }

    /// Procs that deal damage
    pub fn damage_procs(&self) -> impl Iterator<Item = &ProcDescriptor> {
        self.procs.values().filter(|p| p.is_damage_proc())
    }
}
