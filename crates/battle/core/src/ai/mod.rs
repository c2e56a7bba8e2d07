//! Decision making for monsters and for party members that lost control to
//! an ailment.
//!
//! The round scheduler builds one [`PlanningContext`] per round and asks it
//! for each actor's [`PlannedAction`](crate::action::PlannedAction). Player
//! decisions are normally supplied by the host; only Panic and Crazy party
//! members are rewritten here.
//!
//! # Layers
//!
//! 1. [`range`]: pure rectangle queries over the grid.
//! 2. `spots`: slot selection (is a move/attack possible, and where to).
//! 3. `monster` / `afflicted`: action choice and parameter building.
//!
//! Every random decision goes through the context's [`RngOracle`], so a
//! scripted rng reproduces a plan exactly.
mod afflicted;
mod monster;
pub mod range;
mod spots;

use crate::combat::DamageTracker;
use crate::env::{ItemOracle, RngOracle, SpellOracle};
use crate::state::{Battlefield, Combatant, CombatantId, Side, Slot};

pub use range::{Bounds, RangeKind};

/// Blackboard for one round of planning.
///
/// Combatants are borrowed mutably because a monster that runs out of
/// ammunition swaps or drops its weapon while deciding, and may lose morale
/// doing so.
pub struct PlanningContext<'a> {
    pub field: &'a Battlefield,
    pub combatants: &'a mut [Combatant],
    pub tracker: &'a DamageTracker,
    /// Party members in party order.
    pub party: &'a [CombatantId],
    pub fled: &'a [CombatantId],
    pub items: &'a dyn ItemOracle,
    pub spells: &'a dyn SpellOracle,
    pub rng: &'a mut dyn RngOracle,
}

impl<'a> PlanningContext<'a> {
    pub fn combatant(&self, id: CombatantId) -> &Combatant {
        &self.combatants[id.index()]
    }

    pub(crate) fn side_at(&self, slot: Slot) -> Option<Side> {
        self.field
            .occupant(slot)
            .map(|id| self.combatant(id).side())
    }

    pub(crate) fn has_fled(&self, id: CombatantId) -> bool {
        self.fled.contains(&id)
    }

    /// Uniform pick from a non-empty candidate list.
    pub(crate) fn pick<T: Copy>(&mut self, candidates: &[T]) -> Option<T> {
        if candidates.is_empty() {
            return None;
        }
        let index = self.rng.random_int(0, candidates.len() as i32 - 1);
        candidates.get(index as usize).copied()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::collections::HashMap;

    use crate::combat::DamageTracker;
    use crate::env::{AmmunitionType, ItemDefinition, ItemKind, ItemOracle};
    use crate::state::{
        Abilities, Attributes, Battlefield, Combatant, CombatantId, CombatValues, ItemId,
        MonsterTraits, Slot,
    };

    pub const SWORD: ItemId = ItemId(1);
    pub const BOW: ItemId = ItemId(2);
    pub const ARROWS: ItemId = ItemId(3);
    pub const AXE: ItemId = ItemId(4);

    pub struct Catalog(pub HashMap<ItemId, ItemDefinition>);

    impl ItemOracle for Catalog {
        fn definition(&self, id: ItemId) -> Option<&ItemDefinition> {
            self.0.get(&id)
        }
    }

    pub fn catalog() -> Catalog {
        let defs = [
            ItemDefinition::new(SWORD, "Sword", ItemKind::CloseRangeWeapon),
            ItemDefinition::new(BOW, "Bow", ItemKind::LongRangeWeapon)
                .with_hands(2)
                .with_ammunition(AmmunitionType::Arrow),
            ItemDefinition::new(ARROWS, "Arrows", ItemKind::Ammunition)
                .with_ammunition(AmmunitionType::Arrow),
            ItemDefinition::new(AXE, "Axe", ItemKind::CloseRangeWeapon),
        ];
        Catalog(defs.into_iter().map(|d| (d.id, d)).collect())
    }

    pub fn hero(speed: u32) -> Combatant {
        Combatant::party_member("Hero", 5, 40)
            .with_attributes(Attributes {
                speed,
                ..Attributes::default()
            })
            .with_abilities(Abilities {
                attack: 100,
                ..Abilities::default()
            })
    }

    pub fn orc(speed: u32) -> Combatant {
        Combatant::monster(
            "Orc",
            3,
            20,
            MonsterTraits {
                morale: 50,
                ..MonsterTraits::default()
            },
        )
        .with_attributes(Attributes {
            speed,
            ..Attributes::default()
        })
        .with_abilities(Abilities {
            attack: 100,
            ..Abilities::default()
        })
        .with_combat(CombatValues {
            base_attack: 5,
            ..CombatValues::default()
        })
    }

    /// Arena plus field with every combatant at its slot.
    pub struct Scene {
        pub combatants: Vec<Combatant>,
        pub field: Battlefield,
        pub party: Vec<CombatantId>,
        pub tracker: DamageTracker,
    }

    impl Scene {
        pub fn new(entries: Vec<(Combatant, usize)>) -> Self {
            let mut field = Battlefield::new();
            let mut party = Vec::new();
            let mut combatants = Vec::new();
            for (index, (combatant, slot)) in entries.into_iter().enumerate() {
                let id = CombatantId(index as u16);
                if combatant.is_party_member() {
                    party.push(id);
                }
                field.place(id, Slot::new(slot).unwrap()).unwrap();
                combatants.push(combatant);
            }
            let tracker = DamageTracker::new(combatants.len());
            Self {
                combatants,
                field,
                party,
                tracker,
            }
        }
    }
}
