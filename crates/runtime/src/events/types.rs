//! Payloads the runtime adds on top of the battle's own events.

use serde::{Deserialize, Serialize};

use battle_core::{BattleEndInfo, TextColor};

/// One line of battle log text with its colour hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub text: String,
    pub color: TextColor,
}

/// Round and session lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    RoundStarted { round: u32 },
    RoundCompleted { round: u32 },
    /// The battle waits for a click and the session does not auto-click.
    AwaitingClick,
    PartyAdvanced,
    Ended(BattleEndInfo),
}
