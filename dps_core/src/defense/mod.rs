//! Target defenses - Armor mitigation and hit tables

mod armour;
mod hit;

pub use armour::{armor_mitigate, armor_mitigation_multiplier, ArmorConstants};
pub use hit::{melee_hit_chance, spell_hit_chance, HitBonuses, HitChances, HitTable, WeaponSetup};
