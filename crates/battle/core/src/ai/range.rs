//! Range queries over the battlefield grid.

use std::ops::RangeInclusive;

use crate::config::BattleConfig;
use crate::env::ItemOracle;
use crate::state::{Combatant, EquipmentSlot, Side, Slot};

/// What a range query is looking for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RangeKind {
    Move,
    Enemy,
}

/// Inclusive rectangle of slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bounds {
    pub min_column: usize,
    pub max_column: usize,
    pub min_row: usize,
    pub max_row: usize,
}

impl Bounds {
    pub fn columns(self) -> RangeInclusive<usize> {
        self.min_column..=self.max_column
    }

    pub fn rows(self) -> RangeInclusive<usize> {
        self.min_row..=self.max_row
    }

    /// Slots in row-major order. Empty when `min_row > max_row`.
    pub fn slots(self) -> impl Iterator<Item = Slot> {
        self.rows().flat_map(move |row| {
            self.columns()
                .filter_map(move |column| Slot::at(column, row))
        })
    }

    /// The 3x3 neighbourhood of a slot, clipped to the grid.
    pub fn around(slot: Slot) -> Self {
        Self {
            min_column: slot.column().saturating_sub(1),
            max_column: (slot.column() + 1).min(BattleConfig::COLUMNS - 1),
            min_row: slot.row().saturating_sub(1),
            max_row: (slot.row() + 1).min(BattleConfig::ROWS - 1),
        }
    }
}

/// Rectangle a combatant may reach from `origin`.
///
/// Monsters target rows 3..=4 and move within rows 0..=3; party members the
/// other way round. A fleeing monster only looks at rows behind it and has
/// nowhere to go from the back row (`None`). A monster that is not fleeing
/// never looks behind its own row.
pub fn range_bounds(
    origin: Slot,
    side: Side,
    range: usize,
    kind: RangeKind,
    fleeing: bool,
) -> Option<Bounds> {
    let column = origin.column();
    let row = origin.row();
    let last_row = BattleConfig::ROWS - 1;

    let party_rows = (
        row.saturating_sub(range).max(BattleConfig::PARTY_MIN_ROW),
        (row + range).min(last_row),
    );
    let monster_rows = (
        row.saturating_sub(range),
        (row + range).min(BattleConfig::MONSTER_MAX_ROW),
    );
    let (mut min_row, mut max_row) = match (side, kind) {
        (Side::Monsters, RangeKind::Enemy) | (Side::Party, RangeKind::Move) => party_rows,
        (Side::Monsters, RangeKind::Move) | (Side::Party, RangeKind::Enemy) => monster_rows,
    };

    if side == Side::Monsters {
        if fleeing {
            if row == 0 {
                return None;
            }
            // Straight back only; a fleeing monster never moves sideways.
            max_row = row - 1;
        } else {
            min_row = row;
        }
    }

    Some(Bounds {
        min_column: column.saturating_sub(range),
        max_column: (column + range).min(BattleConfig::COLUMNS - 1),
        min_row,
        max_row,
    })
}

/// Legal move distance: `speed / 40` clamped to 1..=3.
pub fn move_range(combatant: &Combatant) -> usize {
    (combatant.speed() / BattleConfig::MOVE_RANGE_SPEED_DIVISOR)
        .clamp(1, BattleConfig::MAX_MOVE_RANGE) as usize
}

/// `Some(has_ammo)` when the combatant wields a long-ranged weapon.
///
/// Weapons without an ammunition type always count as loaded; otherwise the
/// off hand must hold at least one unit of the matching ammunition.
pub fn ranged_attack(combatant: &Combatant, items: &dyn ItemOracle) -> Option<bool> {
    let weapon = items.definition(combatant.equipment.weapon()?)?;
    if !weapon.is_long_ranged() {
        return None;
    }
    let Some(needed) = weapon.required_ammunition() else {
        return Some(true);
    };
    let off_hand = combatant.equipment.get(EquipmentSlot::LeftHand);
    let loaded = !off_hand.is_empty()
        && off_hand
            .item
            .and_then(|id| items.definition(id))
            .is_some_and(|ammo| ammo.provides_ammunition(needed));
    Some(loaded)
}

pub fn has_long_ranged_weapon(combatant: &Combatant, items: &dyn ItemOracle) -> bool {
    ranged_attack(combatant, items).is_some()
}

/// Six squares with a loaded long-ranged weapon, one otherwise.
pub fn attack_range(combatant: &Combatant, items: &dyn ItemOracle) -> usize {
    if ranged_attack(combatant, items) == Some(true) {
        BattleConfig::RANGED_ATTACK_RANGE as usize
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(column: usize, row: usize) -> Slot {
        Slot::at(column, row).unwrap()
    }

    #[test]
    fn monster_melee_range_reaches_the_party_front_row_from_row_two() {
        let bounds = range_bounds(slot(2, 2), Side::Monsters, 1, RangeKind::Enemy, false).unwrap();
        assert_eq!(bounds.rows(), 2..=3);
        assert_eq!(bounds.columns(), 1..=3);
    }

    #[test]
    fn monster_in_back_row_cannot_flee_further() {
        assert_eq!(
            range_bounds(slot(0, 0), Side::Monsters, 1, RangeKind::Move, true),
            None
        );
        let bounds = range_bounds(slot(0, 2), Side::Monsters, 3, RangeKind::Move, true).unwrap();
        assert_eq!(bounds.rows(), 0..=1);
    }

    #[test]
    fn party_moves_stay_in_party_rows() {
        let bounds = range_bounds(slot(5, 4), Side::Party, 2, RangeKind::Move, false).unwrap();
        assert_eq!(bounds.rows(), 3..=4);
        assert_eq!(bounds.columns(), 3..=5);
        let bounds = range_bounds(slot(5, 3), Side::Party, 1, RangeKind::Enemy, false).unwrap();
        assert_eq!(bounds.rows(), 2..=3);
    }

    #[test]
    fn neighbourhood_is_clipped_at_the_corner() {
        let cells: Vec<_> = Bounds::around(slot(0, 4)).slots().collect();
        assert_eq!(cells, vec![slot(0, 3), slot(1, 3), slot(0, 4), slot(1, 4)]);
    }
}
