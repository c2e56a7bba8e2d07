//! Spell table loader.
//!
//! The file only lists spells whose cost, target shape or monster
//! availability differ from the built-in table.

use std::collections::HashSet;
use std::path::Path;

use battle_core::SpellInfo;
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpellTable {
    #[serde(default)]
    pub overrides: Vec<SpellInfo>,
}

/// Loader for spell table overrides.
pub struct SpellLoader;

impl SpellLoader {
    pub fn load(path: &Path) -> LoadResult<Vec<SpellInfo>> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<Vec<SpellInfo>> {
        let table: SpellTable = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse spell table RON: {}", e))?;

        let mut seen = HashSet::new();
        for info in &table.overrides {
            if !seen.insert(info.spell) {
                anyhow::bail!("Spell {} is overridden twice", info.spell);
            }
        }
        Ok(table.overrides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::{Spell, SpellTarget};

    #[test]
    fn parses_overrides() {
        let overrides = SpellLoader::parse(
            r#"(
                overrides: [
                    (spell: Fireball, target: AllEnemies, sp_cost: 60, castable_by_monster: false),
                ],
            )"#,
        )
        .unwrap();

        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides[0].spell, Spell::Fireball);
        assert_eq!(overrides[0].target, SpellTarget::AllEnemies);
        assert_eq!(overrides[0].sp_cost, 60);
    }

    #[test]
    fn empty_table_is_allowed() {
        assert!(SpellLoader::parse("()").unwrap().is_empty());
    }

    #[test]
    fn duplicate_overrides_are_rejected() {
        let doc = r#"(overrides: [
            (spell: Sleep, target: EnemyRow, sp_cost: 10, castable_by_monster: true),
            (spell: Sleep, target: AllEnemies, sp_cost: 30, castable_by_monster: true),
        ])"#;
        assert!(SpellLoader::parse(doc).is_err());
    }
}
