//! Proc descriptor definitions

use super::behaviour::ProcBehaviour;
use crate::error::{CalcError, CalcResult};
use crate::types::{DamageCategory, Stat};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the behaviour a descriptor starts with
pub const DEFAULT_BEHAVIOUR: &str = "default";

/// A stat granted by a proc
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatBonus {
    pub stat: Stat,
    pub value: f64,
}

/// What a proc does while active
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProcEffect {
    /// Grants one stat per stack
    Stat { stat: Stat, value: f64 },
    /// Grants several stats at once
    Multi { buffs: Vec<StatBonus> },
    /// Deals damage of a category each time it fires
    Damage { category: DamageCategory, value: f64 },
}

impl ProcEffect {
    /// Stat bonuses granted per stack (empty for damage procs)
    pub fn stat_bonuses(&self) -> Vec<StatBonus> {
        match self {
            ProcEffect::Stat { stat, value } => vec![StatBonus {
                stat: *stat,
                value: *value,
            }],
            ProcEffect::Multi { buffs } => buffs.clone(),
            ProcEffect::Damage { .. } => Vec::new(),
        }
    }

    pub fn is_damage(&self) -> bool {
        matches!(self, ProcEffect::Damage { .. })
    }
}

/// One proc, enchant or trinket effect
///
/// Each resolution owns its own copies: the resolved uptime is written in
/// place while resolving.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawProc")]
pub struct ProcDescriptor {
    pub name: String,
    pub effect: ProcEffect,
    /// Buff duration in seconds
    pub duration: f64,
    pub max_stacks: u32,
    pub can_crit: bool,
    /// Speed of the weapon carrying the proc (weapon-speed PPM procs)
    pub weapon_speed: Option<f64>,
    behaviours: BTreeMap<String, ProcBehaviour>,
    active: String,
    uptime: Option<f64>,
}

impl ProcDescriptor {
    /// Create a single-stack proc with one default behaviour
    pub fn new(
        name: impl Into<String>,
        effect: ProcEffect,
        duration: f64,
        behaviour: ProcBehaviour,
    ) -> Self {
        let mut behaviours = BTreeMap::new();
        behaviours.insert(DEFAULT_BEHAVIOUR.to_string(), behaviour);
        ProcDescriptor {
            name: name.into(),
            effect,
            duration,
            max_stacks: 1,
            can_crit: true,
            weapon_speed: None,
            behaviours,
            active: DEFAULT_BEHAVIOUR.to_string(),
            uptime: None,
        }
    }

    pub fn with_max_stacks(mut self, max_stacks: u32) -> Self {
        self.max_stacks = max_stacks;
        self
    }

    pub fn with_weapon_speed(mut self, speed: f64) -> Self {
        self.weapon_speed = Some(speed);
        self
    }

    pub fn without_crit(mut self) -> Self {
        self.can_crit = false;
        self
    }

    /// Register an alternative behaviour that [`rebind`](Self::rebind) can switch to
    pub fn with_behaviour(mut self, name: impl Into<String>, behaviour: ProcBehaviour) -> Self {
        self.behaviours.insert(name.into(), behaviour);
        self
    }

    /// The active behaviour
    pub fn behaviour(&self) -> &ProcBehaviour {
        // `active` always names an entry: set by constructors and rebind only
        &self.behaviours[&self.active]
    }

    pub fn active_behaviour_name(&self) -> &str {
        &self.active
    }

    /// New descriptor with another named behaviour active
    ///
    /// The copy starts unresolved.
    pub fn rebind(&self, behaviour: &str) -> CalcResult<ProcDescriptor> {
        if !self.behaviours.contains_key(behaviour) {
            return Err(CalcError::configuration(format!(
                "Behaviour '{}' is not defined for {}",
                behaviour, self.name
            )));
        }
        let mut rebound = self.clone();
        rebound.active = behaviour.to_string();
        rebound.uptime = None;
        Ok(rebound)
    }

    /// Resolved uptime (average active stacks); `None` until resolved
    pub fn uptime(&self) -> Option<f64> {
        self.uptime
    }

    pub(crate) fn set_uptime(&mut self, uptime: f64) {
        self.uptime = Some(uptime);
    }

    pub fn is_damage_proc(&self) -> bool {
        self.effect.is_damage()
    }

    pub fn has_icd(&self) -> bool {
        self.behaviour().icd.is_some()
    }

    /// Check descriptor consistency
    pub fn validate(&self) -> CalcResult<()> {
        let fail = |reason: String| {
            Err(CalcError::configuration(format!(
                "Invalid data for proc {}: {}",
                self.name, reason
            )))
        };

        if !self.duration.is_finite() || self.duration <= 0.0 {
            return fail(format!("duration must be positive, got {}", self.duration));
        }
        if self.max_stacks == 0 {
            return fail("max_stacks must be at least 1".to_string());
        }
        if let Some(speed) = self.weapon_speed {
            if !speed.is_finite() || speed <= 0.0 {
                return fail(format!("weapon_speed must be positive, got {speed}"));
            }
        }
        match &self.effect {
            ProcEffect::Multi { buffs } if buffs.is_empty() => {
                return fail("multi-stat proc grants no stats".to_string());
            }
            ProcEffect::Stat { value, .. } | ProcEffect::Damage { value, .. }
                if !value.is_finite() =>
            {
                return fail(format!("value must be finite, got {value}"));
            }
            _ => {}
        }
        if !self.behaviours.contains_key(&self.active) {
            return fail(format!("no behaviour named '{}'", self.active));
        }
        for behaviour in self.behaviours.values() {
            behaviour.validate()?;
        }
        Ok(())
    }
}

/// Proc as authored in configuration files
#[derive(Debug, Clone, Deserialize)]
pub struct RawProc {
    pub name: String,
    pub effect: ProcEffect,
    pub duration: f64,
    #[serde(default = "default_max_stacks")]
    pub max_stacks: u32,
    #[serde(default = "default_can_crit")]
    pub can_crit: bool,
    #[serde(default)]
    pub weapon_speed: Option<f64>,
    pub behaviours: BTreeMap<String, ProcBehaviour>,
    /// Behaviour active on load
    #[serde(default = "default_behaviour_name")]
    pub behaviour: String,
}

fn default_max_stacks() -> u32 {
    1
}

fn default_can_crit() -> bool {
    true
}

fn default_behaviour_name() -> String {
    DEFAULT_BEHAVIOUR.to_string()
}

impl TryFrom<RawProc> for ProcDescriptor {
    type Error = CalcError;

    fn try_from(raw: RawProc) -> Result<Self, Self::Error> {
        let descriptor = ProcDescriptor {
            name: raw.name,
            effect: raw.effect,
            duration: raw.duration,
            max_stacks: raw.max_stacks,
            can_crit: raw.can_crit,
            weapon_speed: raw.weapon_speed,
            behaviours: raw.behaviours,
            active: raw.behaviour,
            uptime: None,
        };
        descriptor.validate()?;
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procs::ProcArchetype;
    use crate::types::TriggerCategory;

    fn avalanche() -> ProcDescriptor {
        ProcDescriptor::new(
            "avalanche",
            ProcEffect::Damage {
                category: DamageCategory::Spell,
                value: 500.0,
            },
            1.0,
            ProcBehaviour::ppm(5.0, TriggerCategory::AllAttacks),
        )
        .with_behaviour(
            "spell",
            ProcBehaviour::chance(0.25, TriggerCategory::DamagingSpells).with_icd(10.0),
        )
    }

    #[test]
    fn test_rebind_returns_new_descriptor() {
        let mut proc = avalanche();
        proc.set_uptime(0.5);

        let spell = proc.rebind("spell").unwrap();
        assert_eq!(spell.active_behaviour_name(), "spell");
        assert_eq!(spell.behaviour().archetype, ProcArchetype::Chance { chance: 0.25 });
        assert!(spell.uptime().is_none());

        // Original untouched
        assert_eq!(proc.active_behaviour_name(), DEFAULT_BEHAVIOUR);
        assert_eq!(proc.uptime(), Some(0.5));
    }

    #[test]
    fn test_rebind_unknown_behaviour() {
        let err = avalanche().rebind("heal").unwrap_err();
        assert!(matches!(err, CalcError::Configuration(_)));
    }

    #[test]
    fn test_stat_bonuses() {
        let effect = ProcEffect::Multi {
            buffs: vec![
                StatBonus {
                    stat: Stat::CritRating,
                    value: 1000.0,
                },
                StatBonus {
                    stat: Stat::HasteRating,
                    value: 1000.0,
                },
            ],
        };
        assert_eq!(effect.stat_bonuses().len(), 2);
        assert!(avalanche().effect.stat_bonuses().is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_duration() {
        let proc = ProcDescriptor::new(
            "broken",
            ProcEffect::Stat {
                stat: Stat::Agility,
                value: 100.0,
            },
            0.0,
            ProcBehaviour::real_ppm(1.0, TriggerCategory::AllAttacks),
        );
        assert!(proc.validate().is_err());
    }

    #[test]
    fn test_parse_proc() {
        let toml_str = r#"
name = "dancing_steel"
duration = 12
effect = { kind = "stat", stat = "agility", value = 1650 }

[behaviours.default]
trigger = "all_attacks"
real_ppm = true
ppm = 2.53
"#;
        let proc: ProcDescriptor = toml::from_str(toml_str).unwrap();
        assert_eq!(proc.name, "dancing_steel");
        assert_eq!(proc.max_stacks, 1);
        assert!(proc.behaviour().is_real_ppm());
    }

    #[test]
    fn test_parse_proc_missing_active_behaviour() {
        let toml_str = r#"
name = "broken"
duration = 12
behaviour = "spell"
effect = { kind = "stat", stat = "agility", value = 1650 }

[behaviours.default]
trigger = "all_attacks"
proc_chance = 0.1
"#;
        assert!(toml::from_str::<ProcDescriptor>(toml_str).is_err());
    }
}
