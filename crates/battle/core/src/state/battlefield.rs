//! The 6x5 battle grid and its reverse lookup.
//!
//! Rows 0-2 belong to monsters (row 0 at the back), rows 3-4 to the party
//! (row 4 at the back). Row 3 is shared: monsters may advance into it.

use thiserror::Error;

use crate::config::BattleConfig;
use crate::error::{ErrorSeverity, GameError};
use crate::state::CombatantId;

/// Index of a battlefield square, `column + row * 6`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Slot(u8);

impl Slot {
    pub fn new(index: usize) -> Option<Self> {
        (index < BattleConfig::SLOTS).then_some(Self(index as u8))
    }

    pub fn at(column: usize, row: usize) -> Option<Self> {
        if column >= BattleConfig::COLUMNS || row >= BattleConfig::ROWS {
            return None;
        }
        Self::new(column + row * BattleConfig::COLUMNS)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn column(self) -> usize {
        self.index() % BattleConfig::COLUMNS
    }

    pub const fn row(self) -> usize {
        self.index() / BattleConfig::COLUMNS
    }

    pub fn all() -> impl Iterator<Item = Slot> {
        (0..BattleConfig::SLOTS as u8).map(Slot)
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.column(), self.row())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BattlefieldError {
    #[error("slot {slot} is already occupied by {occupant}")]
    SlotOccupied { slot: Slot, occupant: CombatantId },

    #[error("combatant {combatant} is not on the battlefield")]
    NotOnField { combatant: CombatantId },

    #[error("combatant {combatant} is already placed at {slot}")]
    AlreadyPlaced { combatant: CombatantId, slot: Slot },
}

impl GameError for BattlefieldError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Internal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::SlotOccupied { .. } => "BATTLEFIELD_SLOT_OCCUPIED",
            Self::NotOnField { .. } => "BATTLEFIELD_NOT_ON_FIELD",
            Self::AlreadyPlaced { .. } => "BATTLEFIELD_ALREADY_PLACED",
        }
    }
}

/// Slot occupancy with an explicit combatant-to-slot index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Battlefield {
    squares: [Option<CombatantId>; BattleConfig::SLOTS],
    positions: Vec<Option<Slot>>,
}

impl Default for Battlefield {
    fn default() -> Self {
        Self::new()
    }
}

impl Battlefield {
    pub fn new() -> Self {
        Self {
            squares: [None; BattleConfig::SLOTS],
            positions: Vec::new(),
        }
    }

    pub fn occupant(&self, slot: Slot) -> Option<CombatantId> {
        self.squares[slot.index()]
    }

    pub fn is_free(&self, slot: Slot) -> bool {
        self.occupant(slot).is_none()
    }

    pub fn slot_of(&self, combatant: CombatantId) -> Option<Slot> {
        self.positions.get(combatant.index()).copied().flatten()
    }

    pub fn contains(&self, combatant: CombatantId) -> bool {
        self.slot_of(combatant).is_some()
    }

    pub fn place(&mut self, combatant: CombatantId, slot: Slot) -> Result<(), BattlefieldError> {
        if let Some(current) = self.slot_of(combatant) {
            return Err(BattlefieldError::AlreadyPlaced {
                combatant,
                slot: current,
            });
        }
        if let Some(occupant) = self.occupant(slot) {
            return Err(BattlefieldError::SlotOccupied { slot, occupant });
        }
        if self.positions.len() <= combatant.index() {
            self.positions.resize(combatant.index() + 1, None);
        }
        self.squares[slot.index()] = Some(combatant);
        self.positions[combatant.index()] = Some(slot);
        Ok(())
    }

    pub fn move_to(&mut self, combatant: CombatantId, slot: Slot) -> Result<Slot, BattlefieldError> {
        let from = self
            .slot_of(combatant)
            .ok_or(BattlefieldError::NotOnField { combatant })?;
        if from == slot {
            return Ok(from);
        }
        if let Some(occupant) = self.occupant(slot) {
            return Err(BattlefieldError::SlotOccupied { slot, occupant });
        }
        self.squares[from.index()] = None;
        self.squares[slot.index()] = Some(combatant);
        self.positions[combatant.index()] = Some(slot);
        Ok(from)
    }

    /// Takes a combatant off the field, returning the slot it occupied.
    pub fn remove(&mut self, combatant: CombatantId) -> Option<Slot> {
        let slot = self.slot_of(combatant)?;
        self.squares[slot.index()] = None;
        self.positions[combatant.index()] = None;
        Some(slot)
    }

    /// All occupied squares in slot order.
    pub fn occupied(&self) -> impl Iterator<Item = (Slot, CombatantId)> + '_ {
        Slot::all().filter_map(|slot| self.occupant(slot).map(|id| (slot, id)))
    }

    pub fn row(&self, row: usize) -> impl Iterator<Item = (Slot, CombatantId)> + '_ {
        (0..BattleConfig::COLUMNS)
            .filter_map(move |column| Slot::at(column, row))
            .filter_map(|slot| self.occupant(slot).map(|id| (slot, id)))
    }

    pub fn is_row_empty(&self, row: usize) -> bool {
        self.row(row).next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(index: usize) -> Slot {
        Slot::new(index).expect("valid slot")
    }

    #[test]
    fn slot_coordinates_follow_column_plus_row_times_six() {
        let s = slot(20);
        assert_eq!(s.column(), 2);
        assert_eq!(s.row(), 3);
        assert_eq!(Slot::at(2, 3), Some(s));
        assert_eq!(Slot::new(30), None);
        assert_eq!(Slot::at(6, 0), None);
    }

    #[test]
    fn reverse_lookup_tracks_moves_and_removals() {
        let mut field = Battlefield::new();
        let orc = CombatantId(3);
        field.place(orc, slot(7)).expect("place");
        assert_eq!(field.slot_of(orc), Some(slot(7)));

        assert_eq!(field.move_to(orc, slot(13)), Ok(slot(7)));
        assert!(field.is_free(slot(7)));
        assert_eq!(field.occupant(slot(13)), Some(orc));

        assert_eq!(field.remove(orc), Some(slot(13)));
        assert!(!field.contains(orc));
        assert_eq!(field.remove(orc), None);
    }

    #[test]
    fn one_combatant_per_slot() {
        let mut field = Battlefield::new();
        field.place(CombatantId(0), slot(18)).expect("place");
        assert_eq!(
            field.place(CombatantId(1), slot(18)),
            Err(BattlefieldError::SlotOccupied {
                slot: slot(18),
                occupant: CombatantId(0)
            })
        );
        field.place(CombatantId(1), slot(19)).expect("place");
        assert!(field.move_to(CombatantId(1), slot(18)).is_err());
    }

    #[test]
    fn row_queries_see_only_that_row() {
        let mut field = Battlefield::new();
        field.place(CombatantId(0), slot(12)).expect("place");
        field.place(CombatantId(1), slot(25)).expect("place");
        assert!(!field.is_row_empty(2));
        assert!(field.is_row_empty(3));
        assert_eq!(field.row(4).collect::<Vec<_>>(), vec![(slot(25), CombatantId(1))]);
    }
}
