//! Data-driven battle content and its loaders.
//!
//! Catalogues live in RON files and tuning in TOML:
//! - item catalogue (`items.ron`)
//! - spell table overrides (`spells.ron`)
//! - party roster (`party.ron`) and monster templates (`monsters.ron`)
//! - encounters pairing a party with a monster group (`encounters/*.ron`)
//! - battle configuration (`config.toml`)
//!
//! Content is consumed by runtime oracles and never appears in battle state.
//! Loaders deserialize `battle-core` types directly through its `serde`
//! feature.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{
    ConfigLoader, ContentFactory, EncounterLoader, EncounterSpec, ItemLoader, LoadResult,
    MonsterLoader, MonsterSpec, PartyLoader, PartyMemberSpec, SpellLoader,
};
