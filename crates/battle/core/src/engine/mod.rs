//! Battle orchestration.
//!
//! [`Battle`] owns the combatants, the grid and the round's action queue.
//! The host drives it with four calls:
//!
//! 1. [`Battle::start_round`] with the party's decisions. Poison ticks,
//!    monsters and afflicted party members are planned, and the queue is
//!    built in speed order.
//! 2. [`Battle::advance`] once per host tick. It fires delayed steps and
//!    dequeues the next action whenever the previous one has finished.
//! 3. [`Battle::submit_click`] when the click gate is enabled and the
//!    battle asked for an acknowledgment.
//! 4. [`Battle::animation_finished`] when a pending animation completes.
//!
//! Everything visible is reported through a [`PresentationSink`]. Steps
//! that wait for an animation or a message delay store a continuation and
//! pick up where they left off; at most one is outstanding at any time.
mod errors;
mod execute;
mod outcome;
mod round;
mod sink;
mod spell;


pub use errors::BattleError;
pub use sink::{
    AnimationKind, AnimationProgress, AnimationRequest, AnimationTicket, BattleEndInfo,
    BattleEvent, BattleMessage, BrokenItem, PresentationSink, RecordingSink, TextColor,
};

use std::collections::VecDeque;

use tracing::{debug, info};

use crate::action::{ActionQueue, CastSpellParam, PlannedAction, QueuedAction};
use crate::combat::DamageTracker;
use crate::config::BattleConfig;
use crate::env::{BattleEnv, SpellInfo};
use crate::state::{ActiveSpells, Battlefield, Combatant, CombatantId, Side, Slot};

/// A party member and its formation position (0..12, front row first).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PartyEntry {
    pub combatant: Combatant,
    pub position: u8,
}

/// A monster and its starting square (rows 0-2).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonsterEntry {
    pub combatant: Combatant,
    pub slot: Slot,
}

/// Everything needed to open a battle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BattleSetup {
    pub party: Vec<PartyEntry>,
    pub monsters: Vec<MonsterEntry>,
    pub active_spells: ActiveSpells,
    /// Monster hit points are shown from the start.
    pub show_monster_lp: bool,
}

impl BattleSetup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_party_member(mut self, combatant: Combatant, position: u8) -> Self {
        self.party.push(PartyEntry {
            combatant,
            position,
        });
        self
    }

    pub fn with_monster(mut self, combatant: Combatant, slot: Slot) -> Self {
        self.monsters.push(MonsterEntry { combatant, slot });
        self
    }

    pub fn with_active_spells(mut self, active_spells: ActiveSpells) -> Self {
        self.active_spells = active_spells;
        self
    }
}

/// Where a suspended step continues.
#[derive(Debug)]
enum Resume {
    Finish {
        needs_click: bool,
    },
    Poison {
        remaining: VecDeque<CombatantId>,
    },
    PoisonLanded {
        monster: CombatantId,
        damage: u32,
        remaining: VecDeque<CombatantId>,
    },
    CompleteMove {
        actor: CombatantId,
        target: Slot,
    },
    CompleteFlee {
        actor: CombatantId,
    },
    AttackMessage {
        message: BattleMessage,
        color: TextColor,
    },
    HurtLanded {
        attacker: CombatantId,
        target: CombatantId,
    },
    DeathRemoval {
        attacker: Option<CombatantId>,
        target: CombatantId,
        then: Box<Resume>,
    },
    SpellStart,
    SpellNextTarget,
    SpellApply {
        target: CombatantId,
    },
    SpellTargetDamaged {
        target: CombatantId,
        damage: u32,
    },
    SpellEnd {
        needs_click: bool,
    },
}

#[derive(Debug)]
struct PendingAnimation {
    ticket: AnimationTicket,
    resume: Resume,
}

#[derive(Debug)]
struct Delayed {
    due: u64,
    resume: Resume,
}

/// The spell being resolved and the targets it has yet to reach.
#[derive(Debug)]
struct SpellCast {
    caster: CombatantId,
    param: CastSpellParam,
    info: SpellInfo,
    targets: VecDeque<CombatantId>,
}

/// A running battle between the party and one monster group.
#[derive(Debug)]
pub struct Battle {
    config: BattleConfig,
    env: BattleEnv,
    /// Arena of every combatant; party members first, in party order.
    combatants: Vec<Combatant>,
    party: Vec<CombatantId>,
    initial_monsters: Vec<CombatantId>,
    field: Battlefield,
    tracker: DamageTracker,
    queue: ActionQueue,
    active_spells: ActiveSpells,
    parrying: Vec<CombatantId>,
    fled: Vec<CombatantId>,
    hurried: Vec<CombatantId>,
    dropped_weapon: Vec<CombatantId>,
    broken_items: Vec<BrokenItem>,
    rde: u32,
    round: u32,
    show_monster_lp: bool,
    round_active: bool,
    ready: bool,
    wait_for_click: bool,
    clock: u64,
    /// Party decisions of the round being built.
    party_plans: Vec<PlannedAction>,
    current: Option<QueuedAction>,
    pending: Option<PendingAnimation>,
    delayed: Option<Delayed>,
    cast: Option<SpellCast>,
    next_ticket: u64,
    outcome: Option<BattleEndInfo>,
}

impl Battle {
    /// Places both sides and opens the battle.
    ///
    /// Party members sit at `18 + position`; dead members join the arena
    /// but not the grid. Monsters must start in rows 0-2.
    pub fn new(setup: BattleSetup, env: BattleEnv, config: BattleConfig) -> Result<Self, BattleError> {
        if setup.party.is_empty() || setup.party.len() > BattleConfig::MAX_PARTY_MEMBERS {
            return Err(BattleError::InvalidSetup {
                reason: "the party needs one to six members",
            });
        }
        if setup.monsters.is_empty() {
            return Err(BattleError::InvalidSetup {
                reason: "a battle needs at least one monster",
            });
        }

        let mut field = Battlefield::new();
        let mut combatants = Vec::with_capacity(setup.party.len() + setup.monsters.len());
        let mut party = Vec::with_capacity(setup.party.len());
        let mut initial_monsters = Vec::with_capacity(setup.monsters.len());

        for entry in setup.party {
            if !entry.combatant.is_party_member() {
                return Err(BattleError::InvalidSetup {
                    reason: "party entries must be party members",
                });
            }
            let slot = Slot::new(BattleConfig::PARTY_ZONE_START + usize::from(entry.position))
                .ok_or(BattleError::InvalidSetup {
                    reason: "party position out of range",
                })?;
            let id = CombatantId(combatants.len() as u16);
            if entry.combatant.is_alive() {
                field.place(id, slot)?;
            }
            party.push(id);
            combatants.push(entry.combatant);
        }

        for entry in setup.monsters {
            if !entry.combatant.is_monster() {
                return Err(BattleError::InvalidSetup {
                    reason: "monster entries must be monsters",
                });
            }
            if entry.slot.row() >= BattleConfig::PARTY_MIN_ROW {
                return Err(BattleError::InvalidSetup {
                    reason: "monsters start in rows 0 to 2",
                });
            }
            let id = CombatantId(combatants.len() as u16);
            field.place(id, entry.slot)?;
            initial_monsters.push(id);
            combatants.push(entry.combatant);
        }

        info!(
            party = party.len(),
            monsters = initial_monsters.len(),
            "battle opened"
        );

        Ok(Self {
            config,
            env,
            tracker: DamageTracker::new(combatants.len()),
            combatants,
            party,
            initial_monsters,
            field,
            queue: ActionQueue::new(),
            active_spells: setup.active_spells,
            parrying: Vec::new(),
            fled: Vec::new(),
            hurried: Vec::new(),
            dropped_weapon: Vec::new(),
            broken_items: Vec::new(),
            rde: BattleConfig::RDE_SCALE,
            round: 0,
            show_monster_lp: setup.show_monster_lp,
            round_active: false,
            ready: false,
            wait_for_click: false,
            clock: 0,
            party_plans: Vec::new(),
            current: None,
            pending: None,
            delayed: None,
            cast: None,
            next_ticket: 0,
            outcome: None,
        })
    }

    // ===== host API =====

    /// Starts a round with the party's decisions, indexed like the party.
    /// Missing entries count as [`PlannedAction::None`].
    pub fn start_round(
        &mut self,
        party_actions: Vec<PlannedAction>,
        clock: u64,
        sink: &mut dyn PresentationSink,
    ) -> Result<(), BattleError> {
        if self.outcome.is_some() {
            return Err(BattleError::BattleEnded);
        }
        if self.round_active {
            return Err(BattleError::RoundAlreadyActive);
        }
        self.clock = clock;
        self.round += 1;
        self.party_plans = party_actions;
        self.round_active = true;
        debug!(round = self.round, "round started");
        self.begin_round(sink)
    }

    /// Drives the battle forward at host time `clock`.
    pub fn advance(&mut self, clock: u64, sink: &mut dyn PresentationSink) -> Result<(), BattleError> {
        self.clock = clock;
        if self.outcome.is_some() {
            return Ok(());
        }
        if let Some(delayed) = self.delayed.take_if(|delayed| delayed.due <= clock) {
            self.resume(delayed.resume, sink)?;
        }
        if self.can_dequeue() && !(self.config.needs_click_for_next_action && self.wait_for_click) {
            self.next_action(sink)?;
        }
        Ok(())
    }

    /// Acknowledges the message the battle is waiting on.
    pub fn submit_click(&mut self, clock: u64, sink: &mut dyn PresentationSink) -> Result<(), BattleError> {
        self.clock = clock;
        if !self.wait_for_click {
            return Ok(());
        }
        self.wait_for_click = false;
        if self.outcome.is_none() && self.can_dequeue() && self.config.needs_click_for_next_action {
            self.next_action(sink)?;
        }
        Ok(())
    }

    /// Continues the step that waited for `ticket`.
    pub fn animation_finished(
        &mut self,
        ticket: AnimationTicket,
        sink: &mut dyn PresentationSink,
    ) -> Result<(), BattleError> {
        match self.pending.take() {
            Some(pending) if pending.ticket == ticket => self.resume(pending.resume, sink),
            other => {
                self.pending = other;
                Err(BattleError::UnexpectedAnimation { ticket })
            }
        }
    }

    /// Moves every monster one row towards the party between rounds.
    ///
    /// Returns false without changes when [`Self::can_advance_row`] does not
    /// hold.
    pub fn advance_party(&mut self, sink: &mut dyn PresentationSink) -> Result<bool, BattleError> {
        if self.outcome.is_some() {
            return Err(BattleError::BattleEnded);
        }
        if self.round_active {
            return Err(BattleError::RoundAlreadyActive);
        }
        if !self.can_advance_row() {
            return Ok(false);
        }
        sink.show_message(BattleMessage::PartyAdvances, TextColor::BrightGray);
        self.step_monsters_forward(sink)?;
        Ok(true)
    }

    // ===== queries =====

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.get(id.index())
    }

    pub fn combatants(&self) -> &[Combatant] {
        &self.combatants
    }

    pub fn combatant_at(&self, slot: Slot) -> Option<&Combatant> {
        self.field.occupant(slot).and_then(|id| self.combatant(id))
    }

    pub fn slot_of(&self, id: CombatantId) -> Option<Slot> {
        self.field.slot_of(id)
    }

    pub fn field(&self) -> &Battlefield {
        &self.field
    }

    pub fn party(&self) -> &[CombatantId] {
        &self.party
    }

    pub fn initial_monsters(&self) -> &[CombatantId] {
        &self.initial_monsters
    }

    /// Monsters still standing on the grid.
    pub fn monsters_on_field(&self) -> impl Iterator<Item = CombatantId> + '_ {
        self.side_on_field(Side::Monsters)
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// Relative damage efficiency computed at the start of the last round.
    pub fn rde(&self) -> u32 {
        self.rde
    }

    pub fn is_round_active(&self) -> bool {
        self.round_active
    }

    pub fn is_waiting_for_click(&self) -> bool {
        self.wait_for_click
    }

    pub fn pending_animation(&self) -> Option<AnimationTicket> {
        self.pending.as_ref().map(|pending| pending.ticket)
    }

    pub fn show_monster_lp(&self) -> bool {
        self.show_monster_lp
    }

    pub fn queue(&self) -> &ActionQueue {
        &self.queue
    }

    pub fn is_parrying(&self, id: CombatantId) -> bool {
        self.parrying.contains(&id)
    }

    pub fn is_hurried(&self, id: CombatantId) -> bool {
        self.hurried.contains(&id)
    }

    pub fn end_info(&self) -> Option<&BattleEndInfo> {
        self.outcome.as_ref()
    }

    pub fn is_ended(&self) -> bool {
        self.outcome.is_some()
    }

    /// The middle row is empty and no monster stands in the shared row, so
    /// the party may advance instead of acting.
    pub fn can_advance_row(&self) -> bool {
        self.field.is_row_empty(2)
            && !self
                .field
                .row(BattleConfig::MONSTER_MAX_ROW)
                .any(|(_, id)| self.combatants[id.index()].is_monster())
    }

    /// Hands the party back to the host once the battle is over.
    pub fn into_party(self) -> Vec<Combatant> {
        let party = self.party.len();
        self.combatants.into_iter().take(party).collect()
    }

    // ===== shared helpers =====

    fn can_dequeue(&self) -> bool {
        self.round_active && self.ready && self.pending.is_none() && self.delayed.is_none()
    }

    fn get(&self, id: CombatantId) -> &Combatant {
        &self.combatants[id.index()]
    }

    fn get_mut(&mut self, id: CombatantId) -> &mut Combatant {
        &mut self.combatants[id.index()]
    }

    fn name(&self, id: CombatantId) -> String {
        self.get(id).name.clone()
    }

    fn is_party(&self, id: CombatantId) -> bool {
        self.get(id).is_party_member()
    }

    fn color_of(&self, id: CombatantId) -> TextColor {
        if self.is_party(id) {
            TextColor::BattlePlayer
        } else {
            TextColor::BattleMonster
        }
    }

    fn side_on_field(&self, side: Side) -> impl Iterator<Item = CombatantId> + '_ {
        self.field
            .occupied()
            .map(|(_, id)| id)
            .filter(move |id| self.combatants[id.index()].side() == side)
    }

    /// Runs `resume` after the configured message delay.
    fn proceed(&mut self, resume: Resume, sink: &mut dyn PresentationSink) -> Result<(), BattleError> {
        match self.config.message_delay_ticks {
            0 => self.resume(resume, sink),
            delay => {
                self.delayed = Some(Delayed {
                    due: self.clock + delay,
                    resume,
                });
                Ok(())
            }
        }
    }

    /// Requests an animation and runs `resume` once it has played.
    fn animate(
        &mut self,
        kind: AnimationKind,
        resume: Resume,
        sink: &mut dyn PresentationSink,
    ) -> Result<(), BattleError> {
        let ticket = AnimationTicket(self.next_ticket);
        self.next_ticket += 1;
        match sink.request_animation(AnimationRequest { ticket, kind }) {
            AnimationProgress::Finished => self.resume(resume, sink),
            AnimationProgress::Pending => {
                self.pending = Some(PendingAnimation { ticket, resume });
                Ok(())
            }
        }
    }

    /// Marks the current action as done so the next one can be dequeued.
    fn finish_action(&mut self, needs_click: bool, sink: &mut dyn PresentationSink) {
        if let Some(current) = self.current.take() {
            sink.notify(BattleEvent::ActionCompleted(current));
        }
        if self.config.needs_click_for_next_action && needs_click {
            self.wait_for_click = true;
            sink.notify(BattleEvent::AcknowledgmentRequired);
        }
        self.ready = true;
    }

    fn resume(&mut self, resume: Resume, sink: &mut dyn PresentationSink) -> Result<(), BattleError> {
        if self.outcome.is_some() {
            return Ok(());
        }
        match resume {
            Resume::Finish { needs_click } => {
                self.finish_action(needs_click, sink);
                Ok(())
            }
            Resume::Poison { remaining } => self.poison_next(remaining, sink),
            Resume::PoisonLanded {
                monster,
                damage,
                remaining,
            } => self.poison_landed(monster, damage, remaining, sink),
            Resume::CompleteMove { actor, target } => self.complete_move(actor, target, sink),
            Resume::CompleteFlee { actor } => self.complete_flee(actor, sink),
            Resume::AttackMessage { message, color } => {
                sink.show_message(message, color);
                self.proceed(Resume::Finish { needs_click: true }, sink)
            }
            Resume::HurtLanded { attacker, target } => {
                if self.get(target).is_alive() {
                    self.finish_action(false, sink);
                    Ok(())
                } else {
                    self.handle_death(
                        Some(attacker),
                        target,
                        Resume::Finish { needs_click: false },
                        sink,
                    )
                }
            }
            Resume::DeathRemoval {
                attacker,
                target,
                then,
            } => self.complete_death(attacker, target, *then, sink),
            Resume::SpellStart => self.start_casting(sink),
            Resume::SpellNextTarget => self.cast_next_target(sink),
            Resume::SpellApply { target } => self.apply_spell_effect(Some(target), sink),
            Resume::SpellTargetDamaged { target, damage } => {
                self.spell_damage_landed(target, damage, sink)
            }
            Resume::SpellEnd { needs_click } => self.end_cast(needs_click, sink),
        }
    }
}
