//! Proc behaviour - how and how often a proc fires

use crate::error::{CalcError, CalcResult};
use crate::types::TriggerCategory;
use serde::{Deserialize, Serialize};

/// Rate model of a proc
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProcArchetype {
    /// Real procs-per-minute: scales with haste, has bad-luck protection
    RealPpm { ppm: f64 },
    /// Fixed chance per triggering event
    Chance { chance: f64 },
    /// Procs-per-minute normalized to weapon speed
    Ppm { ppm: f64 },
}

/// One validated behaviour of a proc
///
/// Authored in TOML as a flat record of flags (see [`RawBehaviour`]) and
/// validated on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBehaviour", into = "RawBehaviour")]
pub struct ProcBehaviour {
    pub archetype: ProcArchetype,
    /// Internal cooldown in seconds
    pub icd: Option<f64>,
    pub trigger: TriggerCategory,
    /// Only critical events trigger the proc
    pub on_crit: bool,
    /// Strikes that are themselves procs can trigger it
    pub on_procced_strikes: bool,
}

impl ProcBehaviour {
    /// Real-PPM behaviour with no internal cooldown
    pub fn real_ppm(ppm: f64, trigger: TriggerCategory) -> Self {
        Self::with_archetype(ProcArchetype::RealPpm { ppm }, trigger)
    }

    /// Chance-on-trigger behaviour with no internal cooldown
    pub fn chance(chance: f64, trigger: TriggerCategory) -> Self {
        Self::with_archetype(ProcArchetype::Chance { chance }, trigger)
    }

    /// Weapon-speed PPM behaviour with no internal cooldown
    pub fn ppm(ppm: f64, trigger: TriggerCategory) -> Self {
        Self::with_archetype(ProcArchetype::Ppm { ppm }, trigger)
    }

    fn with_archetype(archetype: ProcArchetype, trigger: TriggerCategory) -> Self {
        ProcBehaviour {
            archetype,
            icd: None,
            trigger,
            on_crit: false,
            on_procced_strikes: true,
        }
    }

    /// Set the internal cooldown
    pub fn with_icd(mut self, icd: f64) -> Self {
        self.icd = Some(icd);
        self
    }

    /// Only trigger on critical events
    pub fn on_crit_only(mut self) -> Self {
        self.on_crit = true;
        self
    }

    pub fn is_real_ppm(&self) -> bool {
        matches!(self.archetype, ProcArchetype::RealPpm { .. })
    }

    /// Internal cooldown, if any
    pub fn icd(&self) -> Option<f64> {
        self.icd
    }

    /// Chance to proc on a single triggering event
    ///
    /// Weapon-speed PPM procs need the speed of the weapon they sit on.
    pub fn per_trigger_chance(&self, proc_name: &str, weapon_speed: Option<f64>) -> CalcResult<f64> {
        match self.archetype {
            ProcArchetype::Chance { chance } => Ok(chance),
            ProcArchetype::Ppm { ppm } => match weapon_speed {
                Some(speed) => Ok(ppm * speed / 60.0),
                None => Err(CalcError::configuration(format!(
                    "Weapon speed needed to calculate the proc rate of {proc_name}"
                ))),
            },
            ProcArchetype::RealPpm { .. } => Err(CalcError::configuration(format!(
                "Proc {proc_name} is real PPM and has no per-trigger chance"
            ))),
        }
    }

    /// Check parameter ranges
    pub fn validate(&self) -> CalcResult<()> {
        let (label, value) = match self.archetype {
            ProcArchetype::RealPpm { ppm } | ProcArchetype::Ppm { ppm } => ("ppm", ppm),
            ProcArchetype::Chance { chance } => {
                if chance > 1.0 {
                    return Err(CalcError::configuration(format!(
                        "proc_chance {chance} is above 1"
                    )));
                }
                ("proc_chance", chance)
            }
        };
        if !value.is_finite() || value < 0.0 {
            return Err(CalcError::configuration(format!(
                "{label} must be a non-negative number, got {value}"
            )));
        }
        if let Some(icd) = self.icd {
            if !icd.is_finite() || icd <= 0.0 {
                return Err(CalcError::configuration(format!(
                    "icd must be positive, got {icd}"
                )));
            }
        }
        Ok(())
    }
}

/// Behaviour as authored in configuration files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBehaviour {
    pub trigger: TriggerCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proc_chance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ppm: Option<f64>,
    #[serde(default)]
    pub real_ppm: bool,
    #[serde(default)]
    pub on_crit: bool,
    #[serde(default = "default_on_procced_strikes")]
    pub on_procced_strikes: bool,
}

fn default_on_procced_strikes() -> bool {
    true
}

impl TryFrom<RawBehaviour> for ProcBehaviour {
    type Error = CalcError;

    fn try_from(raw: RawBehaviour) -> Result<Self, Self::Error> {
        let archetype = match (raw.real_ppm, raw.proc_chance, raw.ppm) {
            (true, None, Some(ppm)) => ProcArchetype::RealPpm { ppm },
            (true, _, None) => {
                return Err(CalcError::configuration(
                    "real_ppm behaviour needs a ppm value",
                ))
            }
            (true, Some(_), Some(_)) => {
                return Err(CalcError::configuration(
                    "real_ppm behaviour cannot also have a proc_chance",
                ))
            }
            (false, Some(chance), None) => ProcArchetype::Chance { chance },
            (false, None, Some(ppm)) => ProcArchetype::Ppm { ppm },
            (false, Some(_), Some(_)) => {
                return Err(CalcError::configuration(
                    "behaviour has both proc_chance and ppm",
                ))
            }
            (false, None, None) => {
                return Err(CalcError::configuration(
                    "behaviour needs one of proc_chance, ppm or real_ppm",
                ))
            }
        };

        // An icd of zero means no icd
        let icd = raw.icd.filter(|&icd| icd != 0.0);

        let behaviour = ProcBehaviour {
            archetype,
            icd,
            trigger: raw.trigger,
            on_crit: raw.on_crit,
            on_procced_strikes: raw.on_procced_strikes,
        };
        behaviour.validate()?;
        Ok(behaviour)
    }
}

impl From<ProcBehaviour> for RawBehaviour {
    fn from(behaviour: ProcBehaviour) -> Self {
        let (real_ppm, proc_chance, ppm) = match behaviour.archetype {
            ProcArchetype::RealPpm { ppm } => (true, None, Some(ppm)),
            ProcArchetype::Chance { chance } => (false, Some(chance), None),
            ProcArchetype::Ppm { ppm } => (false, None, Some(ppm)),
        };
        RawBehaviour {
            trigger: behaviour.trigger,
            icd: behaviour.icd,
            proc_chance,
            ppm,
            real_ppm,
            on_crit: behaviour.on_crit,
            on_procced_strikes: behaviour.on_procced_strikes,
        }
    }
}
