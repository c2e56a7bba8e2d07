//! High-level battle orchestrator.
//!
//! The runtime owns the battle worker, wires up command and event channels,
//! and exposes a builder-based API for clients to play a battle to its end.

use std::env;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use battle_core::{BattleConfig, BattleEndInfo, BattleSetup, RngOracle};

use crate::api::{BattleHandle, PartyProvider, Result, RuntimeError};
use crate::events::EventBus;
use crate::oracle::OracleManager;
use crate::session::{BattleSession, RoundReport, RoundStatus};
use crate::workers::{BattleWorker, Command};

/// Upper bound on rounds for [`BattleRuntime::run_to_end`].
const MAX_ROUNDS: u32 = 1_000;

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub battle: BattleConfig,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// Acknowledge click gates without asking the client (default: true).
    pub auto_click: bool,
    pub seed: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            battle: BattleConfig::default(),
            event_buffer_size: 100,
            command_buffer_size: 32,
            auto_click: true,
            seed: 0,
        }
    }
}

impl RuntimeConfig {
    /// Overlay process environment variables on `battle`.
    ///
    /// Environment variables:
    /// - `BATTLE_SEED` - seed of the battle's random generator (default: 0)
    /// - `BATTLE_EVENT_BUFFER` - per-topic event capacity (default: 100)
    /// - `BATTLE_COMMAND_BUFFER` - worker command queue size (default: 32)
    /// - `BATTLE_AUTO_CLICK` - acknowledge click gates automatically (default: true)
    pub fn from_env(battle: BattleConfig) -> Self {
        let mut config = Self {
            battle,
            ..Self::default()
        };

        if let Some(seed) = read_env::<u64>("BATTLE_SEED") {
            config.seed = seed;
        }
        if let Some(capacity) = read_env::<usize>("BATTLE_EVENT_BUFFER") {
            config.event_buffer_size = capacity.max(1);
        }
        if let Some(capacity) = read_env::<usize>("BATTLE_COMMAND_BUFFER") {
            config.command_buffer_size = capacity.max(1);
        }
        if let Some(auto_click) = read_env_bool("BATTLE_AUTO_CLICK") {
            config.auto_click = auto_click;
        }

        config
    }
}

/// Plays one battle on a background worker.
///
/// [`BattleHandle`] provides a cloneable façade for clients.
pub struct BattleRuntime {
    handle: BattleHandle,
    party_provider: Option<Box<dyn PartyProvider>>,
    worker_handle: JoinHandle<()>,
}

impl BattleRuntime {
    pub fn builder() -> BattleRuntimeBuilder {
        BattleRuntimeBuilder::new()
    }

    /// Get a cloneable handle to this battle
    pub fn handle(&self) -> BattleHandle {
        self.handle.clone()
    }

    pub fn set_party_provider(&mut self, provider: impl PartyProvider + 'static) {
        self.party_provider = Some(Box::new(provider));
    }

    /// Plans and plays one round.
    ///
    /// Without a party provider every member does nothing.
    pub async fn step(&mut self) -> Result<RoundReport> {
        let snapshot = self.handle.snapshot().await?;
        let plans = match &self.party_provider {
            Some(provider) => provider.plan_round(&snapshot).await?,
            None => Vec::new(),
        };
        let report = self.handle.play_round(plans).await?;
        if matches!(report.status, RoundStatus::Finished { .. }) && self.handle.advance_party().await? {
            debug!("party advanced a row");
        }
        Ok(report)
    }

    /// Plays rounds until the battle ends.
    ///
    /// Fails with [`RuntimeError::AwaitingClick`] when a round stops at a
    /// click gate; clients that gate clicks drive rounds through the handle.
    pub async fn run_to_end(&mut self) -> Result<BattleEndInfo> {
        for _ in 0..MAX_ROUNDS {
            let report = self.step().await?;
            match report.status {
                RoundStatus::Ended(end) => return Ok(end),
                RoundStatus::AwaitingClick => return Err(RuntimeError::AwaitingClick),
                RoundStatus::Finished { .. } => {}
            }
        }
        let round = self.handle.snapshot().await?.round;
        Err(RuntimeError::Stalled {
            round,
            steps: MAX_ROUNDS as usize,
        })
    }

    /// Shutdown the runtime gracefully
    pub async fn shutdown(self) -> Result<()> {
        drop(self.handle);
        self.worker_handle.await.map_err(RuntimeError::WorkerJoin)
    }
}

/// Builder for [`BattleRuntime`].
pub struct BattleRuntimeBuilder {
    config: RuntimeConfig,
    setup: Option<BattleSetup>,
    oracles: Option<OracleManager>,
    rng: Option<Box<dyn RngOracle>>,
    party_provider: Option<Box<dyn PartyProvider>>,
}

impl BattleRuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            setup: None,
            oracles: None,
            rng: None,
            party_provider: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Required: the battle to play.
    pub fn setup(mut self, setup: BattleSetup) -> Self {
        self.setup = Some(setup);
        self
    }

    /// Required: item and spell catalogues.
    pub fn oracles(mut self, oracles: OracleManager) -> Self {
        self.oracles = Some(oracles);
        self
    }

    /// Replace the seeded generator, e.g. with a scripted one.
    pub fn rng(mut self, rng: Box<dyn RngOracle>) -> Self {
        self.rng = Some(rng);
        self
    }

    pub fn party_provider(mut self, provider: impl PartyProvider + 'static) -> Self {
        self.party_provider = Some(Box::new(provider));
        self
    }

    /// Build the runtime and spawn its worker
    pub async fn build(self) -> Result<BattleRuntime> {
        let oracles = self.oracles.ok_or(RuntimeError::MissingOracles)?;
        let setup = self.setup.ok_or(RuntimeError::MissingSetup)?;
        let env = match self.rng {
            Some(rng) => oracles.battle_env_with(rng),
            None => oracles.battle_env(self.config.seed),
        };

        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);
        let session = BattleSession::new(
            setup,
            env,
            self.config.battle.clone(),
            event_bus.clone(),
            self.config.auto_click,
        )?;

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size);
        let handle = BattleHandle::new(command_tx, event_bus);

        let worker = BattleWorker::new(session, command_rx);
        let worker_handle = tokio::spawn(async move {
            worker.run().await;
        });
        info!(seed = self.config.seed, "battle runtime started");

        Ok(BattleRuntime {
            handle,
            party_provider: self.party_provider,
            worker_handle,
        })
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

fn read_env_bool(key: &str) -> Option<bool> {
    match env::var(key).ok()?.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_channel_sizes() {
        let config = RuntimeConfig::default();
        assert_eq!(config.event_buffer_size, 100);
        assert_eq!(config.command_buffer_size, 32);
        assert!(config.auto_click);
    }
}
