use arrayvec::ArrayVec;
use bitflags::bitflags;
use strum::{EnumCount, EnumIter, FromRepr};

use crate::config::BattleConfig;

/// Catalogue identifier of an item.
///
/// Packed attack parameters carry item ids in 11 bits, so valid ids are
/// `1..=0x7ff`; zero stands for "no item" on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemId(pub u16);

impl ItemId {
    pub const MAX: u16 = 0x7ff;
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "item {}", self.0)
    }
}

/// Named equipment slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumCount, EnumIter, FromRepr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum EquipmentSlot {
    Head,
    Neck,
    Body,
    RightHand,
    /// Shield, the second hand of a two-handed weapon, or ammunition.
    LeftHand,
    RightFinger,
    LeftFinger,
    Feet,
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ItemSlotFlags: u8 {
        const CURSED = 1 << 0;
    }
}

/// One equipment or inventory slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ItemSlot {
    pub item: Option<ItemId>,
    pub amount: u16,
    /// Remaining spell charges of a magic item.
    pub charges: u16,
    pub flags: ItemSlotFlags,
}

impl ItemSlot {
    pub const EMPTY: Self = Self {
        item: None,
        amount: 0,
        charges: 0,
        flags: ItemSlotFlags::empty(),
    };

    pub fn holding(item: ItemId, amount: u16) -> Self {
        Self {
            item: Some(item),
            amount,
            ..Self::EMPTY
        }
    }

    pub fn with_charges(mut self, charges: u16) -> Self {
        self.charges = charges;
        self
    }

    pub fn cursed(mut self) -> Self {
        self.flags |= ItemSlotFlags::CURSED;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.item.is_none() || self.amount == 0
    }

    pub fn clear(&mut self) {
        *self = Self::EMPTY;
    }

    /// Removes one unit; the slot empties when the last one is taken.
    /// Returns true when the slot is empty afterwards.
    pub fn take_one(&mut self) -> bool {
        self.amount = self.amount.saturating_sub(1);
        if self.amount == 0 {
            self.clear();
            true
        } else {
            false
        }
    }
}

/// Equipped items by named slot.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Equipment {
    slots: [ItemSlot; EquipmentSlot::COUNT],
}

impl Equipment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, slot: EquipmentSlot, item: ItemSlot) -> Self {
        self.slots[slot as usize] = item;
        self
    }

    pub fn get(&self, slot: EquipmentSlot) -> &ItemSlot {
        &self.slots[slot as usize]
    }

    pub fn get_mut(&mut self, slot: EquipmentSlot) -> &mut ItemSlot {
        &mut self.slots[slot as usize]
    }

    pub fn item(&self, slot: EquipmentSlot) -> Option<ItemId> {
        self.get(slot).item
    }

    pub fn weapon(&self) -> Option<ItemId> {
        self.item(EquipmentSlot::RightHand)
    }

    /// Clears a slot and returns what it held.
    pub fn take(&mut self, slot: EquipmentSlot) -> ItemSlot {
        std::mem::take(&mut self.slots[slot as usize])
    }
}

/// Carried (not equipped) items.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Inventory {
    slots: ArrayVec<ItemSlot, { BattleConfig::MAX_INVENTORY_SLOTS }>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a slot; returns false when the inventory is full.
    pub fn push(&mut self, slot: ItemSlot) -> bool {
        self.slots.try_push(slot).is_ok()
    }

    /// Puts an item into the first empty slot, growing the inventory when
    /// none is free. Returns false when there is no room.
    pub fn store(&mut self, item: ItemSlot) -> bool {
        match self.slots.iter_mut().find(|slot| slot.is_empty()) {
            Some(free) => {
                *free = item;
                true
            }
            None => self.push(item),
        }
    }

    pub fn get(&self, index: usize) -> Option<&ItemSlot> {
        self.slots.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ItemSlot> {
        self.slots.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemSlot> {
        self.slots.iter()
    }

    /// First non-empty slot matching the predicate.
    pub fn position(&self, mut predicate: impl FnMut(ItemId) -> bool) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| !slot.is_empty() && slot.item.is_some_and(&mut predicate))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(ItemSlot::is_empty)
    }
}
