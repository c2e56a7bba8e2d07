//! Combat math: attack resolution, damage formulas, morale and damage
//! tracking.
//!
//! Everything here is a pure function of its inputs plus rolls drawn from
//! the supplied [`crate::env::RngOracle`]; battle state is never touched.
mod attack;
mod damage;
mod morale;
mod result;
mod tracking;

pub use attack::{AttackContext, resolve_attack};
pub use damage::{DamageBuffs, physical_damage, spell_damage};
pub use morale::{FleeSituation, fear, relative_damage_efficiency, wants_to_flee};
pub use result::{AttackResolution, AttackResult};
pub use tracking::{DamageTracker, HitStats};
