//! Battle actions: planned decisions, queued steps and their packed
//! parameters.
mod kind;
mod param;
mod queue;

pub use kind::{BattleActionKind, PlannedAction};
pub use param::{
    AttackParam, CastSpellParam, CodecError, FollowUpFlags, HurtParam, ItemSource, MoveParam,
    PackedParam,
};
pub use queue::{ActionQueue, QueuedAction};
