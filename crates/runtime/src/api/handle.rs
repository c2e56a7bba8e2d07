//! Cloneable façade for issuing commands to the battle worker.
//!
//! [`BattleHandle`] hides channel plumbing and offers async helpers for
//! playing rounds or streaming events from specific topics.
use std::collections::HashMap;

use tokio::sync::{broadcast, mpsc, oneshot};

use battle_core::PlannedAction;

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::session::{BattleSnapshot, RoundReport};
use crate::workers::Command;

/// Client-facing handle to a running battle
#[derive(Clone)]
pub struct BattleHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl BattleHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Start a round with one plan per party member and drive it until it
    /// finishes, the battle ends or a click is needed.
    pub async fn play_round(&self, plans: Vec<PlannedAction>) -> Result<RoundReport> {
        self.request(|reply| Command::PlayRound { plans, reply })
            .await?
    }

    /// Acknowledge the pending message and keep driving the round.
    pub async fn click(&self) -> Result<RoundReport> {
        self.request(|reply| Command::Click { reply }).await?
    }

    /// Move the monsters one row closer. `false` when the front rows are not
    /// both empty.
    pub async fn advance_party(&self) -> Result<bool> {
        self.request(|reply| Command::AdvanceParty { reply })
            .await?
    }

    /// Query the current battle (read-only copy)
    pub async fn snapshot(&self) -> Result<BattleSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Battle` - notifications raised by the rules
    /// - `Topic::Log` - battle messages with their text color
    /// - `Topic::Animation` - animation requests
    /// - `Topic::Session` - round and battle lifecycle
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
