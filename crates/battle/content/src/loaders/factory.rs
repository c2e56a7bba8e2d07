//! Content factory for loading a whole data directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use battle_core::{BattleConfig, BattleSetup, Combatant, ItemDefinition, SpellInfo};

use crate::loaders::{
    ConfigLoader, EncounterLoader, EncounterSpec, ItemLoader, LoadResult, MonsterLoader,
    PartyLoader, PartyMemberSpec, SpellLoader,
};

/// Content factory that loads all battle content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// ├── items.ron
/// ├── spells.ron      (optional)
/// ├── monsters.ron
/// ├── party.ron
/// └── encounters/
///     └── crossroads.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load the battle configuration from `config.toml`.
    pub fn load_config(&self) -> LoadResult<BattleConfig> {
        ConfigLoader::load(&self.data_dir.join("config.toml"))
    }

    /// Load the item catalogue from `items.ron`.
    pub fn load_items(&self) -> LoadResult<Vec<ItemDefinition>> {
        ItemLoader::load(&self.data_dir.join("items.ron"))
    }

    /// Load spell overrides from `spells.ron`; a missing file means the
    /// built-in table is used unchanged.
    pub fn load_spells(&self) -> LoadResult<Vec<SpellInfo>> {
        let path = self.data_dir.join("spells.ron");
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no spell overrides");
            return Ok(Vec::new());
        }
        SpellLoader::load(&path)
    }

    pub fn load_party(&self) -> LoadResult<Vec<PartyMemberSpec>> {
        PartyLoader::load(&self.data_dir.join("party.ron"))
    }

    pub fn load_monsters(&self) -> LoadResult<HashMap<String, Combatant>> {
        MonsterLoader::load(&self.data_dir.join("monsters.ron"))
    }

    /// Load `encounters/{name}.ron`.
    pub fn load_encounter(&self, name: &str) -> LoadResult<EncounterSpec> {
        let path = self
            .data_dir
            .join("encounters")
            .join(format!("{}.ron", name));
        EncounterLoader::load(&path)
    }

    /// Party, monster catalogue and encounter combined into a setup.
    pub fn load_setup(&self, encounter: &str) -> LoadResult<BattleSetup> {
        let party = self.load_party()?;
        let monsters = self.load_monsters()?;
        self.load_encounter(encounter)?.build(&party, &monsters)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_factory_paths() {
        let factory = ContentFactory::new("/tmp/data");
        assert_eq!(factory.data_dir(), Path::new("/tmp/data"));
    }

    #[test]
    fn loads_a_setup_from_files() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "party.ron",
            r#"(members: [(position: 0, combatant: (name: "Tar", kind: PartyMember, level: 2, hit_points: (current: 20, maximum: 20)))])"#,
        );
        write(
            dir.path(),
            "monsters.ron",
            r#"(monsters: [(name: "Rat", kind: Monster((morale: 30)), level: 1, hit_points: (current: 4, maximum: 4))])"#,
        );
        write(
            dir.path(),
            "encounters/cellar.ron",
            r#"(monsters: [(monster: "Rat", slot: 12), (monster: "Rat", slot: 13)])"#,
        );

        let factory = ContentFactory::new(dir.path());
        let setup = factory.load_setup("cellar").unwrap();
        assert_eq!(setup.party[0].combatant.name, "Tar");
        assert_eq!(setup.monsters.len(), 2);
        assert!(factory.load_spells().unwrap().is_empty());
    }

    #[test]
    fn missing_files_name_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = ContentFactory::new(dir.path()).load_items().unwrap_err();
        assert!(err.to_string().contains("items.ron"));
    }

    #[test]
    fn bundled_data_loads() {
        let factory = ContentFactory::new(concat!(env!("CARGO_MANIFEST_DIR"), "/data"));
        assert!(!factory.load_items().unwrap().is_empty());
        factory.load_config().unwrap();
        factory.load_spells().unwrap();
        let setup = factory.load_setup("crossroads").unwrap();
        assert!(!setup.monsters.is_empty());
    }
}
