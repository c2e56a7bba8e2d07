//! Deaths, removals and the end of the battle.

use tracing::{debug, info};

use super::{AnimationKind, Battle, BattleEndInfo, BattleError, BattleEvent, PresentationSink, Resume};
use crate::action::{AttackParam, BattleActionKind, PackedParam};
use crate::state::{CombatantId, Slot};

impl Battle {
    /// Takes a combatant off the grid and cancels its remaining actions.
    pub(super) fn remove_from_field(
        &mut self,
        id: CombatantId,
        sink: &mut dyn PresentationSink,
    ) -> Option<Slot> {
        let slot = self.field.remove(id)?;
        self.queue.skip_actor(id);
        sink.notify(BattleEvent::CombatantRemoved {
            combatant: id,
            slot,
        });
        Some(slot)
    }

    /// Starts the death of `target`. Both the victim and its killer lose
    /// their remaining actions; `then` runs once the body is gone unless the
    /// death ended the battle.
    pub(super) fn handle_death(
        &mut self,
        attacker: Option<CombatantId>,
        target: CombatantId,
        then: Resume,
        sink: &mut dyn PresentationSink,
    ) -> Result<(), BattleError> {
        debug!(%target, attacker = ?attacker, "combatant died");
        self.queue.skip_actor(target);
        if let Some(attacker) = attacker {
            self.queue.skip_actor(attacker);
        }

        let resume = Resume::DeathRemoval {
            attacker,
            target,
            then: Box::new(then),
        };
        match self.field.slot_of(target) {
            Some(slot) if self.get(target).is_monster() => self.animate(
                AnimationKind::Death {
                    combatant: target,
                    slot,
                },
                resume,
                sink,
            ),
            _ => self.resume(resume, sink),
        }
    }

    pub(super) fn complete_death(
        &mut self,
        attacker: Option<CombatantId>,
        target: CombatantId,
        then: Resume,
        sink: &mut dyn PresentationSink,
    ) -> Result<(), BattleError> {
        let slot = self.remove_from_field(target, sink);
        if self.get(target).is_monster() {
            let attacker = attacker.filter(|&id| self.is_party(id));
            if let Some(slot) = slot {
                self.kill_monster(attacker, target, slot, sink);
            }
        } else {
            self.kill_player(target, sink);
        }
        if self.outcome.is_some() {
            return Ok(());
        }
        self.resume(then, sink)
    }

    /// Bookkeeping for a monster that left the grid for good. Party members
    /// whose attacks aimed at its square are told their target is gone.
    pub(super) fn kill_monster(
        &mut self,
        attacker: Option<CombatantId>,
        monster: CombatantId,
        slot: Slot,
        sink: &mut dyn PresentationSink,
    ) {
        sink.notify(BattleEvent::CharacterDied(monster));
        match attacker {
            Some(attacker) => sink.notify(BattleEvent::PlayerLostTarget(attacker)),
            None => {
                let aiming: Vec<CombatantId> = self
                    .party
                    .iter()
                    .copied()
                    .filter(|&member| self.get(member).is_alive())
                    .filter(|&member| {
                        self.queue.iter().any(|entry| {
                            entry.actor == member
                                && entry.kind == BattleActionKind::Attack
                                && AttackParam::decode(entry.param)
                                    .is_ok_and(|param| param.target == slot)
                        })
                    })
                    .collect();
                for member in aiming {
                    sink.notify(BattleEvent::PlayerLostTarget(member));
                }
            }
        }
        if self.monsters_on_field().next().is_none() {
            self.end_battle(true, sink);
        }
    }

    pub(super) fn kill_player(&mut self, member: CombatantId, sink: &mut dyn PresentationSink) {
        sink.notify(BattleEvent::CharacterDied(member));
        let fighting = self.party.iter().any(|&id| {
            let combatant = self.get(id);
            combatant.is_alive() && combatant.ailments.can_fight() && !self.fled.contains(&id)
        });
        if !fighting {
            self.end_battle(false, sink);
        }
    }

    /// Closes the battle and reports the outcome.
    ///
    /// A defeat reports nothing beyond `monsters_defeated == false`.
    pub(super) fn end_battle(&mut self, monsters_defeated: bool, sink: &mut dyn PresentationSink) {
        let end = if monsters_defeated {
            self.victory_summary()
        } else {
            BattleEndInfo::default()
        };
        info!(
            monsters_defeated,
            experience = end.total_experience,
            rounds = self.round,
            "battle ended"
        );

        self.queue.clear();
        self.round_active = false;
        self.ready = false;
        self.wait_for_click = false;
        self.current = None;
        self.cast = None;
        self.pending = None;
        self.delayed = None;
        sink.notify(BattleEvent::BattleEnded(end.clone()));
        self.outcome = Some(end);
    }

    fn victory_summary(&self) -> BattleEndInfo {
        let killed_monsters = self
            .initial_monsters
            .iter()
            .copied()
            .filter(|id| !self.fled.contains(id) && !self.get(*id).is_alive())
            .collect();
        let fled_party_members = self
            .fled
            .iter()
            .copied()
            .filter(|&id| self.is_party(id))
            .collect();
        let total_experience = self
            .initial_monsters
            .iter()
            .filter_map(|&id| self.get(id).monster_traits())
            .map(|traits| traits.defeat_experience)
            .fold(0u32, u32::saturating_add);
        BattleEndInfo {
            monsters_defeated: true,
            killed_monsters,
            fled_party_members,
            total_experience,
            broken_items: self.broken_items.clone(),
        }
    }
}
