//! Content loaders for reading battle data from files.
//!
//! Each loader parses one RON or TOML document into `battle-core` types.
//! [`ContentFactory`] resolves the file names inside a data directory.

pub mod combatants;
pub mod config;
pub mod encounter;
pub mod factory;
pub mod items;
pub mod spells;

pub use combatants::{MonsterLoader, PartyLoader, PartyMemberSpec};
pub use config::ConfigLoader;
pub use encounter::{EncounterLoader, EncounterSpec, MonsterSpec};
pub use factory::ContentFactory;
pub use items::ItemLoader;
pub use spells::SpellLoader;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
