//! Read-only collaborators the battle consults while resolving actions.
//!
//! The battle never owns catalogue data; it borrows item and spell metadata
//! through oracle traits and draws every random number from one
//! [`RngOracle`]. [`BattleEnv`] bundles the three so a battle can be built
//! from any mix of built-in tables, loaded content and scripted rolls.
mod items;
mod rng;
mod spells;

use std::sync::Arc;

pub use items::{AmmunitionType, ItemDefinition, ItemKind, ItemOracle};
pub use rng::{PcgRng, RngOracle, ScriptFallback, ScriptedRng};
pub use spells::{
    Spell, SpellEffect, SpellInfo, SpellOracle, SpellSchool, SpellSchools, SpellTarget,
    StandardSpells,
};

use crate::engine::BattleError;
use crate::state::ItemId;

/// Oracle bundle owned by a battle for its whole lifetime.
pub struct BattleEnv {
    items: Arc<dyn ItemOracle>,
    spells: Arc<dyn SpellOracle>,
    rng: Box<dyn RngOracle>,
}

impl BattleEnv {
    pub fn new(
        items: Arc<dyn ItemOracle>,
        spells: Arc<dyn SpellOracle>,
        rng: Box<dyn RngOracle>,
    ) -> Self {
        Self { items, spells, rng }
    }

    /// Uses the built-in spell table.
    pub fn with_standard_spells(items: Arc<dyn ItemOracle>, rng: Box<dyn RngOracle>) -> Self {
        Self::new(items, Arc::new(StandardSpells), rng)
    }

    pub fn items(&self) -> &dyn ItemOracle {
        self.items.as_ref()
    }

    pub fn spells(&self) -> &dyn SpellOracle {
        self.spells.as_ref()
    }

    pub fn rng(&mut self) -> &mut dyn RngOracle {
        self.rng.as_mut()
    }

    /// Borrows both catalogues alongside the rng so callers can roll while
    /// holding item or spell metadata.
    pub fn split(&mut self) -> (&dyn ItemOracle, &dyn SpellOracle, &mut dyn RngOracle) {
        (self.items.as_ref(), self.spells.as_ref(), self.rng.as_mut())
    }

    /// Looks up an item that must exist in the catalogue.
    pub fn item(&self, id: ItemId) -> Result<&ItemDefinition, BattleError> {
        self.items
            .definition(id)
            .ok_or(BattleError::UnknownItem { item: id })
    }

    pub fn spell(&self, spell: Spell) -> SpellInfo {
        self.spells.info(spell)
    }
}

impl std::fmt::Debug for BattleEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BattleEnv").finish_non_exhaustive()
    }
}
