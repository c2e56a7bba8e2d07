//! Round setup and the dequeue loop.

use std::cmp::Reverse;
use std::collections::VecDeque;

use tracing::{debug, trace};

use super::{AnimationKind, Battle, BattleError, BattleEvent, PresentationSink, Resume};
use crate::action::{BattleActionKind, HurtParam, PackedParam, PlannedAction};
use crate::ai::PlanningContext;
use crate::combat::{FleeSituation, relative_damage_efficiency};
use crate::config::BattleConfig;
use crate::state::{Ailments, CombatantId, Side, Slot};

impl Battle {
    /// Opens a round: monster poison first, then planning and the queue.
    pub(super) fn begin_round(&mut self, sink: &mut dyn PresentationSink) -> Result<(), BattleError> {
        let poisoned: VecDeque<CombatantId> = self
            .monsters_on_field()
            .filter(|&id| {
                let monster = self.get(id);
                monster.is_alive() && monster.ailments.contains(Ailments::POISONED)
            })
            .collect();
        self.poison_next(poisoned, sink)
    }

    pub(super) fn poison_next(
        &mut self,
        mut remaining: VecDeque<CombatantId>,
        sink: &mut dyn PresentationSink,
    ) -> Result<(), BattleError> {
        while let Some(monster) = remaining.pop_front() {
            let Some(slot) = self.field.slot_of(monster) else {
                continue;
            };
            if !self.get(monster).is_alive() {
                continue;
            }
            let damage = self
                .env
                .rng()
                .random_int(BattleConfig::POISON_DAMAGE_MIN, BattleConfig::POISON_DAMAGE_MAX)
                as u32;
            trace!(%monster, damage, "poison tick");
            sink.notify(BattleEvent::DamageDisplayed {
                combatant: monster,
                slot,
                damage,
            });
            self.wake(monster, sink);
            return self.animate(
                AnimationKind::Hurt {
                    combatant: monster,
                    slot,
                },
                Resume::PoisonLanded {
                    monster,
                    damage,
                    remaining,
                },
                sink,
            );
        }
        self.build_queue(sink)
    }

    pub(super) fn poison_landed(
        &mut self,
        monster: CombatantId,
        damage: u32,
        remaining: VecDeque<CombatantId>,
        sink: &mut dyn PresentationSink,
    ) -> Result<(), BattleError> {
        self.get_mut(monster).take_damage(damage);
        if self.get(monster).is_alive() {
            self.poison_next(remaining, sink)
        } else {
            self.handle_death(None, monster, Resume::Poison { remaining }, sink)
        }
    }

    /// Party-vs-monster damage efficiency over the combatants still on the
    /// grid, from their average damage per hit.
    fn compute_rde(&self) -> u32 {
        let average = |ids: &[CombatantId]| {
            ids.iter()
                .filter(|&&id| self.field.contains(id))
                .map(|&id| self.tracker.average(id))
                .fold(0u32, u32::saturating_add)
        };
        let party = average(&self.party);
        let monsters = average(&self.initial_monsters);
        relative_damage_efficiency(party, monsters)
    }

    /// Plans every actor on the grid and fills the queue in speed order.
    fn build_queue(&mut self, sink: &mut dyn PresentationSink) -> Result<(), BattleError> {
        self.rde = self.compute_rde();

        let mut actors: Vec<CombatantId> = self.field.occupied().map(|(_, id)| id).collect();
        actors.sort_by_key(|&id| Reverse(self.get(id).speed()));

        self.parrying.clear();
        self.queue.clear();
        for id in std::mem::take(&mut self.dropped_weapon) {
            if actors.contains(&id) {
                self.queue.push(id, BattleActionKind::DropWeapon, 0, false);
            }
        }

        let party_plans = std::mem::take(&mut self.party_plans);
        let mut party_reserved: Vec<Slot> = party_plans
            .iter()
            .filter_map(|planned| match planned {
                PlannedAction::Move(param) => Some(param.target),
                _ => None,
            })
            .collect();
        let mut monster_reserved = Vec::new();
        let situation = FleeSituation {
            rde: self.rde,
            monsters_on_field: self.side_on_field(Side::Monsters).count(),
            initial_monsters: self.initial_monsters.len(),
        };

        let mut plans = Vec::with_capacity(actors.len());
        {
            let (items, spells, rng) = self.env.split();
            let mut planner = PlanningContext {
                field: &self.field,
                combatants: &mut self.combatants,
                tracker: &self.tracker,
                party: &self.party,
                fled: &self.fled,
                items,
                spells,
                rng,
            };
            for &actor in &actors {
                let combatant = planner.combatant(actor);
                let ailments = combatant.ailments;
                let planned = if combatant.is_monster() {
                    planner.plan_monster(actor, situation, &mut monster_reserved)
                } else if ailments.contains(Ailments::PANIC) {
                    planner.plan_panic(actor, &party_reserved)
                } else if ailments.contains(Ailments::CRAZY) {
                    planner.plan_mad(actor, &mut party_reserved)
                } else {
                    // Party ids double as party indices.
                    party_plans.get(actor.index()).copied().unwrap_or_default()
                };
                plans.push((actor, planned));
            }
        }

        for (actor, planned) in plans {
            self.enqueue(actor, planned);
        }
        debug!(
            round = self.round,
            rde = self.rde,
            entries = self.queue.len(),
            "round queue built"
        );

        self.round_active = true;
        self.next_action(sink)
    }

    /// Expands one decision into queue entries.
    ///
    /// Attacks repeat once per attack of the round. Party attacks get a
    /// second, skipped batch that a Hurry spell can unlock mid-round.
    fn enqueue(&mut self, actor: CombatantId, planned: PlannedAction) {
        match planned {
            PlannedAction::None => {}
            PlannedAction::Parry => {
                if self.is_party(actor) {
                    self.parrying.push(actor);
                }
            }
            planned => {
                let attacks = self.get(actor).combat.attacks_per_round.max(1) as usize;
                let (entries, visible) = match (planned, self.is_party(actor)) {
                    (PlannedAction::Attack(_), true) => (attacks * 2, attacks),
                    (PlannedAction::Attack(_), false) => (attacks, attacks),
                    _ => (1, 1),
                };
                let kind = planned.kind();
                let param = planned.encode();
                for turn in 0..entries {
                    let skip = turn >= visible;
                    self.queue
                        .push(actor, BattleActionKind::DisplayActionText, 0, skip);
                    self.queue.push(actor, kind, param, skip);
                    if let PlannedAction::Attack(attack) = planned {
                        let chain = HurtParam::for_target(attack.target).encode();
                        for follow_up in BattleActionKind::ATTACK_CHAIN {
                            self.queue.push(actor, follow_up, chain, skip);
                        }
                    }
                }
            }
        }
    }

    /// Dequeues and runs the next action that is not skipped; an empty queue
    /// ends the round.
    pub(super) fn next_action(&mut self, sink: &mut dyn PresentationSink) -> Result<(), BattleError> {
        self.ready = false;
        loop {
            let Some(action) = self.queue.pop() else {
                self.round_active = false;
                debug!(round = self.round, "round finished");
                sink.notify(BattleEvent::RoundFinished { round: self.round });
                return Ok(());
            };
            if action.skip {
                trace!(actor = %action.actor, kind = %action.kind, "skipped");
                continue;
            }
            return self.run_action(action, sink);
        }
    }
}
