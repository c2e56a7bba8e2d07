//! Deterministic turn-based battle rules.
//!
//! `battle-core` owns everything that decides what happens in a battle: the
//! 6x5 grid, combatant state, attack and spell resolution, monster AI and
//! the round scheduler. It performs no I/O. Catalogues and randomness come
//! in through the oracles in [`env`], and every visible effect leaves
//! through an [`engine::PresentationSink`]. All state mutation flows through
//! [`engine::Battle`].
pub mod action;
pub mod ai;
pub mod combat;
pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod state;

pub use action::{
    ActionQueue, AttackParam, BattleActionKind, CastSpellParam, CodecError, FollowUpFlags,
    HurtParam, ItemSource, MoveParam, PackedParam, PlannedAction, QueuedAction,
};
pub use combat::{AttackResult, DamageTracker};
pub use config::BattleConfig;
pub use engine::{
    AnimationKind, AnimationProgress, AnimationRequest, AnimationTicket, Battle, BattleEndInfo,
    BattleError, BattleEvent, BattleMessage, BattleSetup, BrokenItem, MonsterEntry, PartyEntry,
    PresentationSink, RecordingSink, TextColor,
};
pub use env::{
    AmmunitionType, BattleEnv, ItemDefinition, ItemKind, ItemOracle, PcgRng, RngOracle,
    ScriptFallback, ScriptedRng, Spell, SpellEffect, SpellInfo, SpellOracle, SpellSchool,
    SpellSchools, SpellTarget, StandardSpells,
};
pub use error::{ErrorSeverity, GameError};
pub use state::{
    Abilities, ActiveSpells, Ailments, Attributes, Battlefield, BattlefieldError, CombatValues,
    Combatant, CombatantId, CombatantKind, Equipment, EquipmentSlot, Inventory, ItemId, ItemSlot,
    ItemSlotFlags, MonsterFlags, MonsterTraits, ResourceMeter, Side, Slot,
};
