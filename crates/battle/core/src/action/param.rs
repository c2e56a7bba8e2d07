//! Packed 32-bit action parameters.
//!
//! Decisions travel from the planner to the executor as a single `u32` per
//! queued action. Layouts (low bit first):
//!
//! | kind      | bits                                                              |
//! |-----------|-------------------------------------------------------------------|
//! | Move      | `[0,5)` target slot                                               |
//! | Attack    | `[0,5)` target slot, `[5,16)` weapon id, `[16,27)` ammunition id   |
//! | CastSpell | `[0,5)` slot or row, `[5,10)` item slot (0x1f none), `10` equipped, `[11,27)` spell id, `[27,32)` blink destination |
//! | Hurt      | `[0,5)` target slot, `[5,8)` result, `[8,24)` damage, `[24,32)` flags |
//!
//! Encoding masks every field to its width; decoding rejects values that do
//! not name a slot, spell or equipment slot.

use bitflags::bitflags;
use thiserror::Error;

use crate::combat::AttackResult;
use crate::env::{ItemOracle, Spell};
use crate::error::{ErrorSeverity, GameError};
use crate::state::{Combatant, EquipmentSlot, ItemId, Slot};

const SLOT_MASK: u32 = 0x1f;
const ITEM_MASK: u32 = 0x7ff;
const NO_ITEM_SLOT: u32 = 0x1f;
const EQUIPPED_FLAG: u32 = 0x400;
const SPELL_MASK: u32 = 0xffff;
const DAMAGE_MASK: u32 = 0xffff;
const RESULT_MASK: u32 = 0x7;
const HURT_KEEP_MASK: u32 = 0xff00_001f;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("packed slot {value} is outside the battlefield")]
    SlotOutOfRange { value: u32 },

    #[error("packed spell id {value} does not name a known spell")]
    UnknownSpell { value: u32 },

    #[error("packed equipment slot {value} does not exist")]
    UnknownEquipmentSlot { value: u32 },
}

impl GameError for CodecError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Internal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::SlotOutOfRange { .. } => "CODEC_SLOT_OUT_OF_RANGE",
            Self::UnknownSpell { .. } => "CODEC_UNKNOWN_SPELL",
            Self::UnknownEquipmentSlot { .. } => "CODEC_UNKNOWN_EQUIPMENT_SLOT",
        }
    }
}

/// Conversion between a typed parameter and its packed form.
pub trait PackedParam: Sized {
    fn encode(&self) -> u32;
    fn decode(raw: u32) -> Result<Self, CodecError>;
}

fn decode_slot(raw: u32) -> Result<Slot, CodecError> {
    let value = raw & SLOT_MASK;
    Slot::new(value as usize).ok_or(CodecError::SlotOutOfRange { value })
}

fn encode_item(item: Option<ItemId>) -> u32 {
    item.map_or(0, |id| u32::from(id.0)) & ITEM_MASK
}

fn decode_item(raw: u32) -> Option<ItemId> {
    let value = (raw & ITEM_MASK) as u16;
    (value != 0).then_some(ItemId(value))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoveParam {
    pub target: Slot,
}

impl PackedParam for MoveParam {
    fn encode(&self) -> u32 {
        self.target.index() as u32 & SLOT_MASK
    }

    fn decode(raw: u32) -> Result<Self, CodecError> {
        Ok(Self {
            target: decode_slot(raw)?,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackParam {
    pub target: Slot,
    /// `None` attacks unarmed.
    pub weapon: Option<ItemId>,
    pub ammunition: Option<ItemId>,
}

impl AttackParam {
    /// Attack with whatever the combatant has equipped. Ammunition is only
    /// recorded for long-ranged weapons that need it.
    pub fn with_equipped(target: Slot, combatant: &Combatant, items: &dyn ItemOracle) -> Self {
        let weapon = combatant.equipment.weapon();
        let needs_ammunition = weapon
            .and_then(|id| items.definition(id))
            .and_then(|def| def.required_ammunition())
            .is_some();
        let ammunition = if needs_ammunition {
            combatant.equipment.item(EquipmentSlot::LeftHand)
        } else {
            None
        };
        Self {
            target,
            weapon,
            ammunition,
        }
    }
}

impl PackedParam for AttackParam {
    fn encode(&self) -> u32 {
        (self.target.index() as u32 & SLOT_MASK)
            | (encode_item(self.weapon) << 5)
            | (encode_item(self.ammunition) << 16)
    }

    fn decode(raw: u32) -> Result<Self, CodecError> {
        Ok(Self {
            target: decode_slot(raw)?,
            weapon: decode_item(raw >> 5),
            ammunition: decode_item(raw >> 16),
        })
    }
}

/// Where an item-sourced spell comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemSource {
    /// Packed as the zero-based slot, one below the game's slot number.
    Equipment(EquipmentSlot),
    Inventory(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CastSpellParam {
    /// Slot index for single-target spells, row index for row spells.
    pub target: u8,
    pub item: Option<ItemSource>,
    pub spell: Spell,
    /// Destination slot of a Blink; ignored by other spells.
    pub blink_destination: u8,
}

impl CastSpellParam {
    pub fn new(spell: Spell, target: u8) -> Self {
        Self {
            target,
            item: None,
            spell,
            blink_destination: 0,
        }
    }

    pub fn from_item(mut self, source: ItemSource) -> Self {
        self.item = Some(source);
        self
    }

    pub fn with_blink_destination(mut self, destination: Slot) -> Self {
        self.blink_destination = destination.index() as u8;
        self
    }

    pub fn target_slot(&self) -> Option<Slot> {
        Slot::new(self.target as usize)
    }

    pub fn blink_slot(&self) -> Option<Slot> {
        Slot::new(self.blink_destination as usize)
    }
}

impl PackedParam for CastSpellParam {
    fn encode(&self) -> u32 {
        let (item_slot, equipped) = match self.item {
            None => (NO_ITEM_SLOT, false),
            Some(ItemSource::Equipment(slot)) => (slot as u32, true),
            Some(ItemSource::Inventory(index)) => (u32::from(index), false),
        };
        (u32::from(self.target) & SLOT_MASK)
            | ((item_slot & SLOT_MASK) << 5)
            | if equipped { EQUIPPED_FLAG } else { 0 }
            | ((u32::from(self.spell.id()) & SPELL_MASK) << 11)
            | ((u32::from(self.blink_destination) & SLOT_MASK) << 27)
    }

    fn decode(raw: u32) -> Result<Self, CodecError> {
        let item_slot = (raw >> 5) & SLOT_MASK;
        let item = if item_slot == NO_ITEM_SLOT {
            None
        } else if raw & EQUIPPED_FLAG != 0 {
            let slot = EquipmentSlot::from_repr(item_slot as u8)
                .ok_or(CodecError::UnknownEquipmentSlot { value: item_slot })?;
            Some(ItemSource::Equipment(slot))
        } else {
            Some(ItemSource::Inventory(item_slot as u8))
        };
        let spell_id = (raw >> 11) & SPELL_MASK;
        let spell =
            Spell::from_id(spell_id as u16).ok_or(CodecError::UnknownSpell { value: spell_id })?;
        Ok(Self {
            target: (raw & SLOT_MASK) as u8,
            item,
            spell,
            blink_destination: ((raw >> 27) & SLOT_MASK) as u8,
        })
    }
}

bitflags! {
    /// Breakage and ammunition flags shared along an attack's follow-up chain.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct FollowUpFlags: u8 {
        const BREAK_WEAPON = 0x01;
        const BREAK_ARMOR = 0x02;
        const LAST_AMMO = 0x04;
        const BREAK_DEFENDER_WEAPON = 0x08;
        const BREAK_DEFENDER_SHIELD = 0x10;
    }
}

/// Parameter of the Hurt chain (breakage checks, last-ammo notice, Hurt).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HurtParam {
    pub target: Slot,
    pub result: AttackResult,
    pub damage: u16,
    pub flags: FollowUpFlags,
}

impl HurtParam {
    /// Fresh chain parameter for an attack against `target`.
    pub fn for_target(target: Slot) -> Self {
        Self {
            target,
            result: AttackResult::Damage,
            damage: 0,
            flags: FollowUpFlags::empty(),
        }
    }

    /// Replaces damage and result while keeping target and flags.
    pub fn with_outcome(mut self, damage: u32, result: AttackResult) -> Self {
        self.damage = (damage & DAMAGE_MASK) as u16;
        self.result = result;
        self
    }

    pub fn with_flags(mut self, flags: FollowUpFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Packed-level outcome update: clears bits `[5,24)` and writes damage
    /// and result, leaving target and flags untouched.
    pub fn update_raw(raw: u32, damage: u32, result: AttackResult) -> u32 {
        (raw & HURT_KEEP_MASK) | ((damage & DAMAGE_MASK) << 8) | ((result as u32) << 5)
    }

    /// Packed-level flag update; flags OR-combine.
    pub fn flag_raw(raw: u32, flags: FollowUpFlags) -> u32 {
        raw | (u32::from(flags.bits()) << 24)
    }
}

impl PackedParam for HurtParam {
    fn encode(&self) -> u32 {
        (self.target.index() as u32 & SLOT_MASK)
            | ((self.result as u32 & RESULT_MASK) << 5)
            | ((u32::from(self.damage) & DAMAGE_MASK) << 8)
            | (u32::from(self.flags.bits()) << 24)
    }

    fn decode(raw: u32) -> Result<Self, CodecError> {
        let result = AttackResult::from_repr(((raw >> 5) & RESULT_MASK) as u8)
            .unwrap_or(AttackResult::Damage);
        Ok(Self {
            target: decode_slot(raw)?,
            result,
            damage: ((raw >> 8) & DAMAGE_MASK) as u16,
            flags: FollowUpFlags::from_bits_retain((raw >> 24) as u8),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(index: usize) -> Slot {
        Slot::new(index).expect("valid slot")
    }

    #[test]
    fn attack_param_matches_documented_bit_layout() {
        let param = AttackParam {
            target: slot(9),
            weapon: Some(ItemId(0x123)),
            ammunition: Some(ItemId(0x45)),
        };
        let raw = param.encode();
        assert_eq!(raw, 9 | (0x123 << 5) | (0x45 << 16));
        assert_eq!(AttackParam::decode(raw), Ok(param));
    }

    #[test]
    fn unarmed_attack_encodes_zero_item_ids() {
        let param = AttackParam {
            target: slot(29),
            weapon: None,
            ammunition: None,
        };
        assert_eq!(param.encode(), 29);
        assert_eq!(AttackParam::decode(29), Ok(param));
    }

    #[test]
    fn cast_spell_param_keeps_item_source_and_blink() {
        let param = CastSpellParam::new(Spell::Blink, 20)
            .from_item(ItemSource::Equipment(EquipmentSlot::RightHand))
            .with_blink_destination(slot(27));
        let raw = param.encode();
        assert_ne!(raw & EQUIPPED_FLAG, 0);
        assert_eq!(raw >> 27, 27);
        assert_eq!(CastSpellParam::decode(raw), Ok(param));

        let plain = CastSpellParam::new(Spell::Fireball, 3);
        let raw = plain.encode();
        assert_eq!((raw >> 5) & SLOT_MASK, NO_ITEM_SLOT);
        assert_eq!(CastSpellParam::decode(raw), Ok(plain));
    }

    #[test]
    fn equipped_source_packs_the_zero_based_slot() {
        let item_bits = |slot| {
            let raw = CastSpellParam::new(Spell::HealingHand, 18)
                .from_item(ItemSource::Equipment(slot))
                .encode();
            (raw >> 5) & SLOT_MASK
        };
        assert_eq!(item_bits(EquipmentSlot::Head), 0);
        assert_eq!(item_bits(EquipmentSlot::RightHand), 3);
        assert_eq!(item_bits(EquipmentSlot::Feet), 7);

        let raw = 18 | (8 << 5) | EQUIPPED_FLAG | (u32::from(Spell::HealingHand.id()) << 11);
        assert_eq!(
            CastSpellParam::decode(raw),
            Err(CodecError::UnknownEquipmentSlot { value: 8 })
        );
    }

    #[test]
    fn unknown_spell_ids_are_rejected_on_decode() {
        let raw = 4 | (NO_ITEM_SLOT << 5) | (999 << 11);
        assert_eq!(
            CastSpellParam::decode(raw),
            Err(CodecError::UnknownSpell { value: 999 })
        );
    }

    #[test]
    fn out_of_range_slots_are_rejected_on_decode() {
        assert_eq!(
            MoveParam::decode(31),
            Err(CodecError::SlotOutOfRange { value: 31 })
        );
    }

    #[test]
    fn hurt_param_updates_keep_tile_and_flags_in_any_order() {
        let start = HurtParam::for_target(slot(14)).encode();

        let flags_first = HurtParam::flag_raw(start, FollowUpFlags::LAST_AMMO);
        let flags_first = HurtParam::update_raw(flags_first, 321, AttackResult::CriticalHit);
        let flags_first = HurtParam::flag_raw(flags_first, FollowUpFlags::BREAK_ARMOR);

        let outcome_first = HurtParam::update_raw(start, 321, AttackResult::CriticalHit);
        let outcome_first = HurtParam::flag_raw(outcome_first, FollowUpFlags::BREAK_ARMOR);
        let outcome_first = HurtParam::flag_raw(outcome_first, FollowUpFlags::LAST_AMMO);

        assert_eq!(flags_first, outcome_first);
        let decoded = HurtParam::decode(flags_first).expect("decode");
        assert_eq!(decoded.target, slot(14));
        assert_eq!(decoded.damage, 321);
        assert_eq!(decoded.result, AttackResult::CriticalHit);
        assert_eq!(
            decoded.flags,
            FollowUpFlags::LAST_AMMO | FollowUpFlags::BREAK_ARMOR
        );
    }

    #[test]
    fn hurt_param_flags_sit_in_the_top_byte() {
        let raw = HurtParam::for_target(slot(0))
            .with_flags(FollowUpFlags::BREAK_WEAPON | FollowUpFlags::BREAK_DEFENDER_SHIELD)
            .encode();
        assert_eq!(raw, 0x0100_0000 | 0x1000_0000);
    }

    #[test]
    fn damage_is_masked_to_sixteen_bits() {
        let param = HurtParam::for_target(slot(5)).with_outcome(0x1_0005, AttackResult::Damage);
        assert_eq!(param.damage, 5);
    }
}
