//! Scenario files - a build, its rotation, and its procs

use crate::CliError;
use dps_core::config::{load_toml, parse_toml, CombatConstants};
use dps_core::defense::{HitBonuses, HitChances, WeaponSetup};
use dps_core::procs::ProcDescriptor;
use dps_core::resolver::ResolverConfig;
use dps_core::damage::{DamageAggregator, OnUseDamage};
use dps_core::{AttackKind, CalcResult, DamageCategory, StatModifiers, StatVector};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

/// A complete build to evaluate
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_name")]
    pub name: String,
    /// Base stats before modifiers and procs
    #[serde(default)]
    pub stats: StatVector,
    #[serde(default)]
    pub modifiers: StatModifiers,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub constants: CombatConstants,
    #[serde(default)]
    pub abilities: Vec<AbilitySpec>,
    #[serde(default)]
    pub finisher: Option<FinisherSpec>,
    #[serde(default)]
    pub procs: Vec<ProcDescriptor>,
    /// Activated damage items and racials
    #[serde(default)]
    pub on_use: Vec<OnUseDamage>,
}

fn default_name() -> String {
    "scenario".to_string()
}

/// Character-wide settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Haste multiplier from buffs
    #[serde(default = "default_static_haste")]
    pub static_haste: f64,
    #[serde(default)]
    pub weapon_setup: WeaponSetup,
    #[serde(default)]
    pub hit: HitBonuses,
    /// Attack power per point of agility
    #[serde(default = "default_ap_per_agility")]
    pub ap_per_agility: f64,
    /// Agility per 1% crit
    #[serde(default = "default_agility_per_crit_percent")]
    pub agility_per_crit_percent: f64,
    /// Crit chance from buffs and base crit
    #[serde(default)]
    pub base_crit: f64,
    #[serde(default = "default_crit_damage_multiplier")]
    pub crit_damage_multiplier: f64,
    /// Target armor; the boss default when absent
    #[serde(default)]
    pub target_armor: Option<f64>,
    /// Seconds between a cooldown ending and the next use
    #[serde(default = "default_response_time")]
    pub response_time: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            static_haste: default_static_haste(),
            weapon_setup: WeaponSetup::default(),
            hit: HitBonuses::default(),
            ap_per_agility: default_ap_per_agility(),
            agility_per_crit_percent: default_agility_per_crit_percent(),
            base_crit: 0.0,
            crit_damage_multiplier: default_crit_damage_multiplier(),
            target_armor: None,
            response_time: default_response_time(),
        }
    }
}

fn default_static_haste() -> f64 {
    1.0
}
fn default_ap_per_agility() -> f64 {
    2.0
}
fn default_agility_per_crit_percent() -> f64 {
    1259.0
}
fn default_crit_damage_multiplier() -> f64 {
    2.0
}
fn default_response_time() -> f64 {
    0.5
}

/// An ability used at a fixed, optionally hasted, rate
#[derive(Debug, Clone, Deserialize)]
pub struct AbilitySpec {
    pub name: String,
    pub kind: AttackKind,
    pub category: DamageCategory,
    /// Uses per second with no haste
    pub rate: f64,
    #[serde(default = "default_hasted")]
    pub hasted: bool,
    /// Damage per hit before attack power
    #[serde(default)]
    pub damage: f64,
    /// Damage per point of attack power
    #[serde(default)]
    pub ap_coefficient: f64,
}

fn default_hasted() -> bool {
    true
}

impl AbilitySpec {
    pub fn deals_damage(&self) -> bool {
        self.damage > 0.0 || self.ap_coefficient > 0.0
    }
}

/// A finisher spending everything a builder generated
#[derive(Debug, Clone, Deserialize)]
pub struct FinisherSpec {
    pub name: String,
    pub category: DamageCategory,
    /// Ability that generates the resource
    pub builder: String,
    /// Resource level the finisher waits for
    pub target: u32,
    /// Resource cap, the target when absent
    #[serde(default)]
    pub ceiling: Option<u32>,
    #[serde(default = "default_base_gain")]
    pub base_gain: u32,
    /// Independent chances for a builder to grant one more unit
    #[serde(default)]
    pub extra_gain_chances: Vec<f64>,
    /// Damage per resource spent before attack power
    pub damage_per_point: f64,
    /// Damage per resource spent per point of attack power
    #[serde(default)]
    pub ap_coefficient_per_point: f64,
}

fn default_base_gain() -> u32 {
    1
}

impl FinisherSpec {
    pub fn ceiling(&self) -> u32 {
        self.ceiling.unwrap_or(self.target)
    }
}

impl Scenario {
    /// Load and validate a scenario file
    pub fn from_file(path: &Path) -> Result<Self, CliError> {
        let scenario: Scenario = load_toml(path)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Parse and validate a scenario from TOML text
    pub fn parse(content: &str) -> Result<Self, CliError> {
        let scenario: Scenario = parse_toml(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), CliError> {
        self.constants.validate()?;

        let mut names = BTreeSet::new();
        for ability in &self.abilities {
            if !names.insert(ability.name.as_str()) {
                return Err(CliError::Scenario(format!(
                    "ability '{}' is defined twice",
                    ability.name
                )));
            }
            if !ability.rate.is_finite() || ability.rate < 0.0 {
                return Err(CliError::Scenario(format!(
                    "ability '{}' has invalid rate {}",
                    ability.name, ability.rate
                )));
            }
        }

        if let Some(finisher) = &self.finisher {
            if finisher.target == 0 {
                return Err(CliError::Scenario(format!(
                    "finisher '{}' needs a target of at least 1",
                    finisher.name
                )));
            }
            if !names.contains(finisher.builder.as_str()) {
                return Err(CliError::Scenario(format!(
                    "finisher '{}' uses unknown builder '{}'",
                    finisher.name, finisher.builder
                )));
            }
            if !names.insert(finisher.name.as_str()) {
                return Err(CliError::Scenario(format!(
                    "finisher '{}' shares a name with an ability",
                    finisher.name
                )));
            }
        }

        for proc in &self.procs {
            if names.contains(proc.name.as_str()) {
                return Err(CliError::Scenario(format!(
                    "proc '{}' shares a name with an ability",
                    proc.name
                )));
            }
        }

        for item in &self.on_use {
            if !names.insert(item.name.as_str()) {
                return Err(CliError::Scenario(format!(
                    "on-use '{}' shares a name with an ability",
                    item.name
                )));
            }
        }
        Ok(())
    }

    /// Resolver settings from the scenario's constants and settings
    pub fn resolver_config(&self) -> ResolverConfig {
        let mut config = ResolverConfig::from_constants(&self.constants.resolver);
        config.static_haste = self.settings.static_haste;
        config.modifiers = self.modifiers;
        config.hit_chances = self
            .constants
            .hit
            .hit_chances(self.settings.weapon_setup, &self.settings.hit);
        config
    }

    /// Damage aggregator against the scenario's target, with its on-use items
    pub fn aggregator(&self, hit_chances: HitChances) -> CalcResult<DamageAggregator> {
        let armor = &self.constants.armor;
        let aggregator = match self.settings.target_armor {
            Some(target_armor) => DamageAggregator::with_target_armor(armor, target_armor),
            None => DamageAggregator::new(armor),
        };
        aggregator
            .with_hit_chances(hit_chances)
            .with_on_use(self.on_use.clone(), self.settings.response_time)
    }

    pub fn ability(&self, name: &str) -> Option<&AbilitySpec> {
        self.abilities.iter().find(|a| a.name == name)
    }
}
