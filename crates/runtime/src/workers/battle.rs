//! Battle worker that owns the authoritative [`BattleSession`].
//!
//! Receives commands from [`crate::BattleHandle`], drives the battle and lets
//! the session's sink publish everything that happens to the event bus.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use battle_core::{GameError, PlannedAction};

use crate::api::{Result, RuntimeError};
use crate::session::{BattleSession, BattleSnapshot, RoundReport};

/// Commands that can be sent to the battle worker
pub enum Command {
    /// Start a round with the party's plans and drive it.
    PlayRound {
        plans: Vec<PlannedAction>,
        reply: oneshot::Sender<Result<RoundReport>>,
    },
    /// Acknowledge the message the battle is waiting on.
    Click {
        reply: oneshot::Sender<Result<RoundReport>>,
    },
    /// Move the monsters one row closer between rounds.
    AdvanceParty { reply: oneshot::Sender<Result<bool>> },
    /// Read-only copy of the battle.
    Snapshot { reply: oneshot::Sender<BattleSnapshot> },
}

/// Background task that processes battle commands one at a time.
pub struct BattleWorker {
    session: BattleSession,
    command_rx: mpsc::Receiver<Command>,
}

impl BattleWorker {
    pub fn new(session: BattleSession, command_rx: mpsc::Receiver<Command>) -> Self {
        Self {
            session,
            command_rx,
        }
    }

    /// Main worker loop. Ends when every handle is dropped.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(cmd) = self.command_rx.recv() => self.handle_command(cmd),
                else => break,
            }
        }
        info!(round = self.session.battle().round(), "battle worker stopped");
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::PlayRound { plans, reply } => {
                let result = self.session.play_round(plans).inspect_err(log_failure);
                if reply.send(result).is_err() {
                    debug!("PlayRound reply channel closed (caller dropped)");
                }
            }
            Command::Click { reply } => {
                let result = self.session.click().inspect_err(log_failure);
                if reply.send(result).is_err() {
                    debug!("Click reply channel closed (caller dropped)");
                }
            }
            Command::AdvanceParty { reply } => {
                let result = self.session.advance_party().inspect_err(log_failure);
                if reply.send(result).is_err() {
                    debug!("AdvanceParty reply channel closed (caller dropped)");
                }
            }
            Command::Snapshot { reply } => {
                if reply.send(self.session.snapshot()).is_err() {
                    debug!("Snapshot reply channel closed (caller dropped)");
                }
            }
        }
    }
}

fn log_failure(error: &RuntimeError) {
    warn!(
        code = error.error_code(),
        severity = error.severity().as_str(),
        "battle command failed: {error}"
    );
}
