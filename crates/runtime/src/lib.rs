//! Runtime orchestration for a deterministic battle.
//!
//! This crate wires together the party provider abstraction, oracle access,
//! the headless presentation sink and the battle worker into a runtime API.
//! Consumers embed [`BattleRuntime`] to play rounds, subscribe to events, and
//! inspect the battle through [`BattleHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`session`] drives a battle on a virtual clock
//! - [`oracle`] adapts loaded content to the battle's oracle traits
pub mod api;
pub mod events;
pub mod oracle;
pub mod runtime;
pub mod session;

mod workers;

pub use api::{
    AutoPartyProvider, BattleHandle, ParryProvider, PartyProvider, Result, RuntimeError,
};
pub use events::{ChannelSink, Event, EventBus, LogLine, SessionEvent, Topic};
pub use oracle::{ItemOracleImpl, OracleManager, SpellOracleImpl};
pub use runtime::{BattleRuntime, BattleRuntimeBuilder, RuntimeConfig};
pub use session::{BattleSession, BattleSnapshot, RoundReport, RoundStatus};
