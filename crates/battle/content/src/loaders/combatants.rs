//! Party roster and monster catalogue loaders.

use std::collections::HashMap;
use std::path::Path;

use battle_core::{BattleConfig, Combatant};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// One party member and the party position (0..12) it starts at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyMemberSpec {
    pub position: u8,
    pub combatant: Combatant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyRoster {
    pub members: Vec<PartyMemberSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonsterCatalog {
    pub monsters: Vec<Combatant>,
}

/// Loader for the party roster.
pub struct PartyLoader;

impl PartyLoader {
    pub fn load(path: &Path) -> LoadResult<Vec<PartyMemberSpec>> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<Vec<PartyMemberSpec>> {
        let roster: PartyRoster = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse party RON: {}", e))?;

        if roster.members.is_empty() || roster.members.len() > BattleConfig::MAX_PARTY_MEMBERS {
            anyhow::bail!(
                "Party must have 1 to {} members, found {}",
                BattleConfig::MAX_PARTY_MEMBERS,
                roster.members.len()
            );
        }
        let party_slots = BattleConfig::SLOTS - BattleConfig::PARTY_ZONE_START;
        let mut taken = [false; BattleConfig::SLOTS];
        for member in &roster.members {
            let name = &member.combatant.name;
            if !member.combatant.is_party_member() {
                anyhow::bail!("'{}' in the party roster is not a party member", name);
            }
            let position = usize::from(member.position);
            if position >= party_slots {
                anyhow::bail!("'{}' has position {} outside 0..{}", name, position, party_slots);
            }
            if std::mem::replace(&mut taken[position], true) {
                anyhow::bail!("Party position {} is used twice", position);
            }
        }
        Ok(roster.members)
    }
}

/// Loader for monster templates, keyed by name.
pub struct MonsterLoader;

impl MonsterLoader {
    pub fn load(path: &Path) -> LoadResult<HashMap<String, Combatant>> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<HashMap<String, Combatant>> {
        let catalog: MonsterCatalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse monster catalog RON: {}", e))?;

        let mut monsters = HashMap::with_capacity(catalog.monsters.len());
        for monster in catalog.monsters {
            if !monster.is_monster() {
                anyhow::bail!("'{}' in the monster catalog is not a monster", monster.name);
            }
            let name = monster.name.clone();
            if monsters.insert(name.clone(), monster).is_some() {
                anyhow::bail!("Monster '{}' is defined twice", name);
            }
        }
        tracing::debug!(count = monsters.len(), "monster catalog parsed");
        Ok(monsters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::{Ailments, Spell};

    #[test]
    fn parses_party_members() {
        let members = PartyLoader::parse(
            r#"(members: [
                (position: 2, combatant: (
                    name: "Tar",
                    kind: PartyMember,
                    level: 4,
                    hit_points: (current: 30, maximum: 40),
                    attributes: (speed: 40, strength: 50),
                    spells: [Fireball],
                )),
            ])"#,
        )
        .unwrap();

        let tar = &members[0].combatant;
        assert_eq!(members[0].position, 2);
        assert_eq!(tar.hit_points.current, 30);
        assert_eq!(tar.attributes.speed, 40);
        assert_eq!(tar.spells, vec![Spell::Fireball]);
        assert!(tar.ailments.is_empty());
    }

    #[test]
    fn rejects_shared_positions() {
        let doc = r#"(members: [
            (position: 1, combatant: (name: "A", kind: PartyMember, level: 1, hit_points: (current: 5, maximum: 5))),
            (position: 1, combatant: (name: "B", kind: PartyMember, level: 1, hit_points: (current: 5, maximum: 5))),
        ])"#;
        let err = PartyLoader::parse(doc).unwrap_err();
        assert!(err.to_string().contains("used twice"));
    }

    #[test]
    fn parses_monsters_with_traits_and_ailments() {
        let monsters = MonsterLoader::parse(
            r#"#![enable(unwrap_newtypes)]
            (monsters: [
                (
                    name: "Ghoul",
                    kind: Monster((morale: 80, flags: "UNDEAD", defeat_experience: 40)),
                    level: 6,
                    hit_points: (current: 50, maximum: 50),
                    ailments: "POISONED",
                ),
            ])"#,
        )
        .unwrap();

        let ghoul = &monsters["Ghoul"];
        assert!(ghoul.is_undead());
        assert_eq!(ghoul.monster_traits().map(|t| t.defeat_experience), Some(40));
        assert!(ghoul.ailments.contains(Ailments::POISONED));
    }

    #[test]
    fn monster_catalog_refuses_party_members() {
        let doc = r#"(monsters: [(name: "Tar", kind: PartyMember, level: 1, hit_points: (current: 1, maximum: 1))])"#;
        assert!(MonsterLoader::parse(doc).is_err());
    }
}
