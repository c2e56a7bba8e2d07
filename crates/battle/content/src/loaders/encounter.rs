//! Encounter loader: which monsters stand where, plus battle-wide flags.

use std::collections::HashMap;
use std::path::Path;

use battle_core::{ActiveSpells, BattleConfig, BattleSetup, Combatant, Slot};
use serde::{Deserialize, Serialize};

use crate::loaders::combatants::PartyMemberSpec;
use crate::loaders::{LoadResult, read_file};

/// A monster template placed on a square of the monster rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonsterSpec {
    pub monster: String,
    pub slot: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncounterSpec {
    pub monsters: Vec<MonsterSpec>,
    /// Party buffs already running when the battle opens.
    #[serde(default)]
    pub active_spells: ActiveSpells,
    #[serde(default)]
    pub show_monster_lp: bool,
}

impl EncounterSpec {
    /// Resolves monster names against the catalogue and combines the group
    /// with the party into a battle setup.
    pub fn build(
        &self,
        party: &[PartyMemberSpec],
        catalog: &HashMap<String, Combatant>,
    ) -> LoadResult<BattleSetup> {
        let mut setup = BattleSetup::new().with_active_spells(self.active_spells);
        setup.show_monster_lp = self.show_monster_lp;

        for member in party {
            setup = setup.with_party_member(member.combatant.clone(), member.position);
        }
        for spec in &self.monsters {
            let template = catalog
                .get(&spec.monster)
                .ok_or_else(|| anyhow::anyhow!("Unknown monster '{}'", spec.monster))?;
            let slot = monster_slot(spec.slot)?;
            setup = setup.with_monster(template.clone(), slot);
        }
        Ok(setup)
    }
}

fn monster_slot(index: u8) -> LoadResult<Slot> {
    Slot::new(usize::from(index))
        .filter(|slot| slot.row() < BattleConfig::PARTY_MIN_ROW)
        .ok_or_else(|| anyhow::anyhow!("Monster slot {} is outside rows 0-2", index))
}

/// Loader for encounter files.
pub struct EncounterLoader;

impl EncounterLoader {
    pub fn load(path: &Path) -> LoadResult<EncounterSpec> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<EncounterSpec> {
        let encounter: EncounterSpec = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse encounter RON: {}", e))?;

        if encounter.monsters.is_empty() {
            anyhow::bail!("Encounter has no monsters");
        }
        let mut taken = HashMap::new();
        for spec in &encounter.monsters {
            if let Some(other) = taken.insert(spec.slot, &spec.monster) {
                anyhow::bail!(
                    "'{}' and '{}' share slot {}",
                    other,
                    spec.monster,
                    spec.slot
                );
            }
        }
        Ok(encounter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::MonsterTraits;

    fn catalog() -> HashMap<String, Combatant> {
        let orc = Combatant::monster("Orc", 3, 20, MonsterTraits::default());
        HashMap::from([("Orc".to_string(), orc)])
    }

    fn party() -> Vec<PartyMemberSpec> {
        vec![PartyMemberSpec {
            position: 1,
            combatant: Combatant::party_member("Tar", 4, 30),
        }]
    }

    #[test]
    fn builds_a_setup_from_names() {
        let encounter = EncounterLoader::parse(
            r#"(
                monsters: [(monster: "Orc", slot: 13), (monster: "Orc", slot: 14)],
                active_spells: (protection: 2),
                show_monster_lp: true,
            )"#,
        )
        .unwrap();

        let setup = encounter.build(&party(), &catalog()).unwrap();
        assert_eq!(setup.party.len(), 1);
        assert_eq!(setup.monsters.len(), 2);
        assert_eq!(setup.monsters[1].slot.index(), 14);
        assert_eq!(setup.active_spells.protection, 2);
        assert!(setup.show_monster_lp);
    }

    #[test]
    fn unknown_monsters_fail_to_build() {
        let encounter = EncounterLoader::parse(r#"(monsters: [(monster: "Dragon", slot: 3)])"#).unwrap();
        let err = encounter.build(&party(), &catalog()).unwrap_err();
        assert!(err.to_string().contains("Dragon"));
    }

    #[test]
    fn monsters_cannot_start_in_party_rows() {
        let encounter = EncounterLoader::parse(r#"(monsters: [(monster: "Orc", slot: 19)])"#).unwrap();
        assert!(encounter.build(&party(), &catalog()).is_err());
    }

    #[test]
    fn shared_slots_are_rejected() {
        let doc = r#"(monsters: [(monster: "Orc", slot: 4), (monster: "Orc", slot: 4)])"#;
        assert!(EncounterLoader::parse(doc).is_err());
    }
}
