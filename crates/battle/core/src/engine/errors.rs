//! Error types of the battle engine.

use crate::action::{BattleActionKind, CodecError};
use crate::engine::AnimationTicket;
use crate::error::{ErrorSeverity, GameError};
use crate::state::{BattlefieldError, CombatantId, ItemId};

/// Errors surfaced by [`crate::engine::Battle`].
///
/// Host misuse (starting a round twice, acknowledging an animation that was
/// never requested) is recoverable or a validation failure. Everything else
/// means the scheduler or the planner produced a state the rules cannot
/// handle, and the battle should be abandoned.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BattleError {
    #[error("{kind} cannot be executed as a queued action")]
    InvalidQueuedAction { kind: BattleActionKind },

    #[error("combatant {combatant} fired a ranged weapon without ammunition")]
    MissingAmmunition { combatant: CombatantId },

    #[error("{weapon} fires ammunition this combatant cannot use")]
    UnsupportedAmmunition { weapon: ItemId },

    #[error("{item} is not in the item catalogue")]
    UnknownItem { item: ItemId },

    #[error("{kind} has no queued successor to hand its parameter to")]
    FollowUpWithoutSuccessor { kind: BattleActionKind },

    #[error("animation ticket {ticket} is not the pending animation")]
    UnexpectedAnimation { ticket: AnimationTicket },

    #[error("a round is already in progress")]
    RoundAlreadyActive,

    #[error("the battle has already ended")]
    BattleEnded,

    #[error("invalid battle setup: {reason}")]
    InvalidSetup { reason: &'static str },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Battlefield(#[from] BattlefieldError),
}

impl GameError for BattleError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::RoundAlreadyActive | Self::UnexpectedAnimation { .. } => {
                ErrorSeverity::Recoverable
            }
            Self::BattleEnded | Self::InvalidSetup { .. } => ErrorSeverity::Validation,
            Self::Codec(error) => error.severity(),
            Self::Battlefield(error) => error.severity(),
            Self::InvalidQueuedAction { .. }
            | Self::FollowUpWithoutSuccessor { .. }
            | Self::UnknownItem { .. } => ErrorSeverity::Internal,
            Self::MissingAmmunition { .. } | Self::UnsupportedAmmunition { .. } => {
                ErrorSeverity::Fatal
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidQueuedAction { .. } => "BATTLE_INVALID_QUEUED_ACTION",
            Self::MissingAmmunition { .. } => "BATTLE_MISSING_AMMUNITION",
            Self::UnsupportedAmmunition { .. } => "BATTLE_UNSUPPORTED_AMMUNITION",
            Self::UnknownItem { .. } => "BATTLE_UNKNOWN_ITEM",
            Self::FollowUpWithoutSuccessor { .. } => "BATTLE_FOLLOW_UP_WITHOUT_SUCCESSOR",
            Self::UnexpectedAnimation { .. } => "BATTLE_UNEXPECTED_ANIMATION",
            Self::RoundAlreadyActive => "BATTLE_ROUND_ALREADY_ACTIVE",
            Self::BattleEnded => "BATTLE_ENDED",
            Self::InvalidSetup { .. } => "BATTLE_INVALID_SETUP",
            Self::Codec(error) => error.error_code(),
            Self::Battlefield(error) => error.error_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_misuse_is_recoverable_and_rule_breaks_are_not() {
        assert!(BattleError::RoundAlreadyActive.severity().is_recoverable());
        assert!(
            BattleError::MissingAmmunition {
                combatant: CombatantId(2)
            }
            .severity()
            .is_internal()
        );
        let codec = BattleError::from(CodecError::UnknownSpell { value: 999 });
        assert_eq!(codec.error_code(), "CODEC_UNKNOWN_SPELL");
    }
}
