//! Battle data model: combatants, their equipment and the battlefield grid.
mod ailments;
mod battlefield;
mod combatant;
mod equipment;

pub use ailments::Ailments;
pub use battlefield::{Battlefield, BattlefieldError, Slot};
pub use combatant::{
    Abilities, Attributes, CombatValues, Combatant, CombatantId, CombatantKind, MonsterFlags,
    MonsterTraits, ResourceMeter, Side,
};
pub use equipment::{Equipment, EquipmentSlot, Inventory, ItemId, ItemSlot, ItemSlotFlags};

/// Levels of the party's long-running buff spells.
///
/// A level of 0 means the buff is inactive; active buffs scale damage by
/// `(100 + level) / 100`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ActiveSpells {
    pub attack: u32,
    pub protection: u32,
    pub anti_magic: u32,
}
