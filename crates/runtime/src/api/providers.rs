//! Asynchronous abstraction for sourcing the party's decisions.
//!
//! Runtime users plug in [`PartyProvider`] implementations so a battle can be
//! played by a human front-end, a scripted fixture or a simple policy.
//! Monsters are planned by the battle itself.
use std::sync::Arc;

use async_trait::async_trait;
use battle_core::ai::{RangeKind, range};
use battle_core::{AttackParam, ItemOracle, PlannedAction, Side};

use super::errors::Result;
use crate::session::BattleSnapshot;

/// Supplies one [`PlannedAction`] per party member, indexed like
/// [`BattleSnapshot::party`].
#[async_trait]
pub trait PartyProvider: Send + Sync {
    async fn plan_round(&self, snapshot: &BattleSnapshot) -> Result<Vec<PlannedAction>>;
}

/// Every member parries. Useful for tests or as a fallback.
pub struct ParryProvider;

#[async_trait]
impl PartyProvider for ParryProvider {
    async fn plan_round(&self, snapshot: &BattleSnapshot) -> Result<Vec<PlannedAction>> {
        Ok(vec![PlannedAction::Parry; snapshot.party.len()])
    }
}

/// Attacks the first monster each member can reach with its equipped weapon
/// and parries otherwise.
pub struct AutoPartyProvider {
    items: Arc<dyn ItemOracle>,
}

impl AutoPartyProvider {
    pub fn new(items: Arc<dyn ItemOracle>) -> Self {
        Self { items }
    }

    fn plan_member(&self, snapshot: &BattleSnapshot, index: usize) -> PlannedAction {
        let Some(&id) = snapshot.party.get(index) else {
            return PlannedAction::None;
        };
        let (Some(member), Some(origin)) = (snapshot.combatant(id), snapshot.slot_of(id)) else {
            return PlannedAction::None;
        };
        if !member.is_alive() || !member.ailments.can_fight() {
            return PlannedAction::None;
        }

        let reach = range::attack_range(member, self.items.as_ref());
        let Some(bounds) = range::range_bounds(origin, Side::Party, reach, RangeKind::Enemy, false)
        else {
            return PlannedAction::Parry;
        };
        snapshot
            .monsters()
            .filter(|(_, monster)| monster.is_alive())
            .map(|(slot, _)| slot)
            .find(|slot| bounds.slots().any(|candidate| candidate == *slot))
            .map_or(PlannedAction::Parry, |target| {
                PlannedAction::Attack(AttackParam::with_equipped(
                    target,
                    member,
                    self.items.as_ref(),
                ))
            })
    }
}

#[async_trait]
impl PartyProvider for AutoPartyProvider {
    async fn plan_round(&self, snapshot: &BattleSnapshot) -> Result<Vec<PlannedAction>> {
        Ok((0..snapshot.party.len())
            .map(|index| self.plan_member(snapshot, index))
            .collect())
    }
}
