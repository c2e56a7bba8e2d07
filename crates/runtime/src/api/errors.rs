//! Unified error types surfaced by the runtime API.
//!
//! Wraps battle rule failures, content loading and worker coordination so
//! clients can bubble them up with consistent context.
use thiserror::Error;
use tokio::sync::oneshot;

use battle_core::{BattleError, ErrorSeverity, GameError};

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Battle(#[from] BattleError),

    #[error(transparent)]
    Content(#[from] anyhow::Error),

    #[error("oracle manager must be provided before building the runtime")]
    MissingOracles,

    #[error("battle setup must be provided before building the runtime")]
    MissingSetup,

    #[error("battle worker command channel closed")]
    CommandChannelClosed,

    #[error("battle worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("battle worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("round {round} did not settle after {steps} steps")]
    Stalled { round: u32, steps: usize },

    #[error("the battle is waiting for a click")]
    AwaitingClick,

    #[error("party provider returned {provided} plans for {expected} members")]
    PlanCountMismatch { expected: usize, provided: usize },
}

impl GameError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Battle(error) => error.severity(),
            Self::AwaitingClick | Self::PlanCountMismatch { .. } => ErrorSeverity::Recoverable,
            Self::Content(_) | Self::MissingOracles | Self::MissingSetup => {
                ErrorSeverity::Validation
            }
            Self::Stalled { .. } => ErrorSeverity::Internal,
            Self::CommandChannelClosed | Self::ReplyChannelClosed(_) | Self::WorkerJoin(_) => {
                ErrorSeverity::Fatal
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Battle(error) => error.error_code(),
            Self::Content(_) => "RUNTIME_CONTENT",
            Self::MissingOracles => "RUNTIME_MISSING_ORACLES",
            Self::MissingSetup => "RUNTIME_MISSING_SETUP",
            Self::CommandChannelClosed => "RUNTIME_COMMAND_CLOSED",
            Self::ReplyChannelClosed(_) => "RUNTIME_REPLY_CLOSED",
            Self::WorkerJoin(_) => "RUNTIME_WORKER_JOIN",
            Self::Stalled { .. } => "RUNTIME_STALLED",
            Self::AwaitingClick => "RUNTIME_AWAITING_CLICK",
            Self::PlanCountMismatch { .. } => "RUNTIME_PLAN_COUNT",
        }
    }
}
