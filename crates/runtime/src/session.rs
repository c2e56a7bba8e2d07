//! A battle plus the headless presentation that drives it.

use serde::Serialize;
use tracing::{debug, info, warn};

use battle_core::{
    Battle, BattleConfig, BattleEndInfo, BattleEnv, BattleSetup, Combatant, CombatantId,
    PlannedAction, Slot,
};

use crate::api::{Result, RuntimeError};
use crate::events::{ChannelSink, Event, EventBus, SessionEvent};

/// Upper bound on `advance` calls per round before the session gives up.
const MAX_STEPS_PER_ROUND: usize = 100_000;

/// How a drive of the battle stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RoundStatus {
    Finished { round: u32 },
    AwaitingClick,
    Ended(BattleEndInfo),
}

/// What happened while the battle was driven.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundReport {
    pub status: RoundStatus,
    pub messages: Vec<String>,
}

/// Read-only copy of the battle for planning and display.
#[derive(Debug, Clone, Serialize)]
pub struct BattleSnapshot {
    pub round: u32,
    pub combatants: Vec<Combatant>,
    pub party: Vec<CombatantId>,
    pub positions: Vec<(Slot, CombatantId)>,
    pub can_advance_row: bool,
    pub round_active: bool,
    pub ended: Option<BattleEndInfo>,
}

impl BattleSnapshot {
    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.get(id.index())
    }

    pub fn slot_of(&self, id: CombatantId) -> Option<Slot> {
        self.positions
            .iter()
            .find_map(|&(slot, occupant)| (occupant == id).then_some(slot))
    }

    /// Monsters still on the grid.
    pub fn monsters(&self) -> impl Iterator<Item = (Slot, &Combatant)> + '_ {
        self.positions.iter().filter_map(|&(slot, id)| {
            self.combatant(id)
                .filter(|combatant| combatant.is_monster())
                .map(|combatant| (slot, combatant))
        })
    }
}

/// Owns a [`Battle`] and its sink and advances it on a virtual clock.
pub struct BattleSession {
    battle: Battle,
    sink: ChannelSink,
    clock: u64,
    auto_click: bool,
}

impl BattleSession {
    pub fn new(
        setup: BattleSetup,
        env: BattleEnv,
        config: BattleConfig,
        bus: EventBus,
        auto_click: bool,
    ) -> Result<Self> {
        let battle = Battle::new(setup, env, config)?;
        info!(
            party = battle.party().len(),
            monsters = battle.initial_monsters().len(),
            auto_click,
            "session opened"
        );
        Ok(Self {
            battle,
            sink: ChannelSink::new(bus),
            clock: 0,
            auto_click,
        })
    }

    pub fn battle(&self) -> &Battle {
        &self.battle
    }

    pub fn snapshot(&self) -> BattleSnapshot {
        BattleSnapshot {
            round: self.battle.round(),
            combatants: self.battle.combatants().to_vec(),
            party: self.battle.party().to_vec(),
            positions: self.battle.field().occupied().collect(),
            can_advance_row: self.battle.can_advance_row(),
            round_active: self.battle.is_round_active(),
            ended: self.battle.end_info().cloned(),
        }
    }

    /// Starts a round with the party's plans and drives it as far as it goes.
    pub fn play_round(&mut self, plans: Vec<PlannedAction>) -> Result<RoundReport> {
        if self.battle.is_round_active() && self.battle.is_waiting_for_click() {
            return Err(RuntimeError::AwaitingClick);
        }
        let expected = self.battle.party().len();
        if plans.len() > expected {
            return Err(RuntimeError::PlanCountMismatch {
                expected,
                provided: plans.len(),
            });
        }
        self.battle.start_round(plans, self.clock, &mut self.sink)?;
        let round = self.battle.round();
        debug!(round, "round started");
        self.publish(SessionEvent::RoundStarted { round });
        self.drive()
    }

    /// Acknowledges the pending message and keeps driving.
    pub fn click(&mut self) -> Result<RoundReport> {
        if !self.battle.is_waiting_for_click() {
            warn!("click without a pending acknowledgment");
        }
        self.battle.submit_click(self.clock, &mut self.sink)?;
        self.drive()
    }

    /// Moves the monsters one row forward between rounds.
    pub fn advance_party(&mut self) -> Result<bool> {
        let advanced = self.battle.advance_party(&mut self.sink)?;
        if advanced {
            self.publish(SessionEvent::PartyAdvanced);
        }
        Ok(advanced)
    }

    /// Advances the clock until the round finishes, the battle ends, or a
    /// click is needed that the session may not give itself.
    fn drive(&mut self) -> Result<RoundReport> {
        let round = self.battle.round();
        for _ in 0..MAX_STEPS_PER_ROUND {
            if let Some(end) = self.battle.end_info().cloned() {
                info!(
                    round,
                    monsters_defeated = end.monsters_defeated,
                    "session finished"
                );
                self.publish(SessionEvent::Ended(end.clone()));
                return Ok(self.report(RoundStatus::Ended(end)));
            }
            if !self.battle.is_round_active() {
                self.publish(SessionEvent::RoundCompleted { round });
                return Ok(self.report(RoundStatus::Finished { round }));
            }
            if self.battle.is_waiting_for_click() {
                if !self.auto_click && self.battle.config().needs_click_for_next_action {
                    self.publish(SessionEvent::AwaitingClick);
                    return Ok(self.report(RoundStatus::AwaitingClick));
                }
                self.battle.submit_click(self.clock, &mut self.sink)?;
                continue;
            }
            self.clock += 1;
            self.battle.advance(self.clock, &mut self.sink)?;
        }
        Err(RuntimeError::Stalled {
            round,
            steps: MAX_STEPS_PER_ROUND,
        })
    }

    fn report(&mut self, status: RoundStatus) -> RoundReport {
        RoundReport {
            status,
            messages: self.sink.take_lines(),
        }
    }

    fn publish(&self, event: SessionEvent) {
        self.sink.bus().publish(Event::Session(event));
    }
}
