//! Core types shared across the model

use serde::{Deserialize, Serialize};
use std::fmt;

/// A stat tracked by the fixed-point resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    Agility,
    AttackPower,
    #[serde(alias = "crit")]
    CritRating,
    #[serde(alias = "haste")]
    HasteRating,
    #[serde(alias = "mastery")]
    MasteryRating,
}

impl Stat {
    /// Get all stats
    pub fn all() -> &'static [Stat] {
        &[
            Stat::Agility,
            Stat::AttackPower,
            Stat::CritRating,
            Stat::HasteRating,
            Stat::MasteryRating,
        ]
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stat::Agility => "agility",
            Stat::AttackPower => "attack_power",
            Stat::CritRating => "crit_rating",
            Stat::HasteRating => "haste_rating",
            Stat::MasteryRating => "mastery_rating",
        };
        f.pad(name)
    }
}

/// Damage category of a damage-dealing proc or ability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageCategory {
    /// Cast spell: spell hit, spell crit
    Spell,
    /// Physical strike: strike hit, melee crit, armor mitigated
    Physical,
    /// Spell school damage delivered by a melee strike: strike hit, melee crit
    MeleeSpell,
}

/// What kind of event an attack-rate entry counts
///
/// Procs use this to decide which entries can trigger them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackKind {
    /// White melee swings
    AutoAttack,
    /// Yellow melee abilities
    Strike,
    /// Strikes that are themselves the product of a proc (off-hand echoes etc.)
    ProccedStrike,
    /// Resource-consuming melee abilities
    Finisher,
    /// Direct harmful spell hits
    HarmfulSpell,
    /// Periodic spell damage ticks
    PeriodicSpell,
    /// Periodic physical damage ticks
    Bleed,
    /// Application of a periodic effect
    DebuffApplication,
    Heal,
    PeriodicHeal,
    /// Synthetic entry added for a damage-dealing proc; never triggers other procs
    Proc,
}

/// Which action types can trigger a proc
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerCategory {
    AllAttacks,
    AutoAttacks,
    Strikes,
    AllMeleeAttacks,
    AllSpells,
    DamagingSpells,
    HealingSpells,
    AllSpellsAndAttacks,
    AllPeriodicDamage,
    PeriodicSpellDamage,
    Hots,
    Bleeds,
}

impl TriggerCategory {
    pub fn procs_off_auto_attacks(self) -> bool {
        matches!(
            self,
            TriggerCategory::AllAttacks
                | TriggerCategory::AutoAttacks
                | TriggerCategory::AllSpellsAndAttacks
                | TriggerCategory::AllMeleeAttacks
        )
    }

    pub fn procs_off_strikes(self) -> bool {
        matches!(
            self,
            TriggerCategory::AllAttacks
                | TriggerCategory::Strikes
                | TriggerCategory::AllSpellsAndAttacks
                | TriggerCategory::AllMeleeAttacks
        )
    }

    pub fn procs_off_harmful_spells(self) -> bool {
        matches!(
            self,
            TriggerCategory::AllSpells
                | TriggerCategory::DamagingSpells
                | TriggerCategory::AllSpellsAndAttacks
        )
    }

    pub fn procs_off_heals(self) -> bool {
        matches!(
            self,
            TriggerCategory::AllSpells
                | TriggerCategory::HealingSpells
                | TriggerCategory::AllSpellsAndAttacks
        )
    }

    pub fn procs_off_periodic_spell_damage(self) -> bool {
        matches!(
            self,
            TriggerCategory::AllPeriodicDamage | TriggerCategory::PeriodicSpellDamage
        )
    }

    pub fn procs_off_periodic_heals(self) -> bool {
        matches!(self, TriggerCategory::Hots)
    }

    pub fn procs_off_bleeds(self) -> bool {
        matches!(
            self,
            TriggerCategory::AllPeriodicDamage | TriggerCategory::Bleeds
        )
    }

    pub fn procs_off_debuff_application(self) -> bool {
        matches!(
            self,
            TriggerCategory::AllSpellsAndAttacks
                | TriggerCategory::AllAttacks
                | TriggerCategory::AllMeleeAttacks
        )
    }

    /// Whether an event of `kind` can trigger a proc in this category
    pub fn accepts(self, kind: AttackKind) -> bool {
        match kind {
            AttackKind::AutoAttack => self.procs_off_auto_attacks(),
            AttackKind::Strike | AttackKind::ProccedStrike | AttackKind::Finisher => {
                self.procs_off_strikes()
            }
            AttackKind::HarmfulSpell => self.procs_off_harmful_spells(),
            AttackKind::PeriodicSpell => self.procs_off_periodic_spell_damage(),
            AttackKind::Bleed => self.procs_off_bleeds(),
            AttackKind::DebuffApplication => self.procs_off_debuff_application(),
            AttackKind::Heal => self.procs_off_heals(),
            AttackKind::PeriodicHeal => self.procs_off_periodic_heals(),
            AttackKind::Proc => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_melee_triggers() {
        assert!(TriggerCategory::AllAttacks.accepts(AttackKind::AutoAttack));
        assert!(TriggerCategory::AllAttacks.accepts(AttackKind::Finisher));
        assert!(!TriggerCategory::Strikes.accepts(AttackKind::AutoAttack));
        assert!(!TriggerCategory::AutoAttacks.accepts(AttackKind::Strike));
    }

    #[test]
    fn test_periodic_triggers() {
        assert!(TriggerCategory::AllPeriodicDamage.accepts(AttackKind::Bleed));
        assert!(TriggerCategory::AllPeriodicDamage.accepts(AttackKind::PeriodicSpell));
        assert!(!TriggerCategory::Bleeds.accepts(AttackKind::PeriodicSpell));
        assert!(TriggerCategory::Hots.accepts(AttackKind::PeriodicHeal));
    }

    #[test]
    fn test_proc_entries_never_trigger() {
        assert!(!TriggerCategory::AllSpellsAndAttacks.accepts(AttackKind::Proc));
    }

    #[test]
    fn test_stat_aliases() {
        #[derive(Deserialize)]
        struct Wrapper {
            stat: Stat,
        }
        let parsed: Wrapper = toml::from_str("stat = \"haste\"").unwrap();
        assert_eq!(parsed.stat, Stat::HasteRating);
        let parsed: Wrapper = toml::from_str("stat = \"attack_power\"").unwrap();
        assert_eq!(parsed.stat, Stat::AttackPower);
    }
}
