//! Item catalogue loader.

use std::collections::HashSet;
use std::path::Path;

use battle_core::{ItemDefinition, ItemId};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// Item catalogue structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemCatalog {
    pub items: Vec<ItemDefinition>,
}

/// Loader for the item catalogue.
pub struct ItemLoader;

impl ItemLoader {
    /// Load the item catalogue from a RON file.
    pub fn load(path: &Path) -> LoadResult<Vec<ItemDefinition>> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parse a catalogue document. Item ids must be unique and fit the
    /// packed range; zero is the "no item" marker.
    pub fn parse(content: &str) -> LoadResult<Vec<ItemDefinition>> {
        let catalog: ItemCatalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse item catalog RON: {}", e))?;

        let mut seen = HashSet::new();
        for item in &catalog.items {
            if item.id.0 == 0 || item.id.0 > ItemId::MAX {
                anyhow::bail!("Item '{}' has id {} outside 1..={}", item.name, item.id.0, ItemId::MAX);
            }
            if !seen.insert(item.id) {
                anyhow::bail!("Duplicate item id {}", item.id.0);
            }
        }
        tracing::debug!(count = catalog.items.len(), "item catalog parsed");
        Ok(catalog.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::{AmmunitionType, ItemKind};

    #[test]
    fn parses_weapons_and_ammunition() {
        let items = ItemLoader::parse(
            r#"#![enable(unwrap_newtypes)]
            (
                items: [
                    (id: 1, name: "Sword", kind: CloseRangeWeapon, break_chance: 5),
                    (id: 2, name: "Longbow", kind: LongRangeWeapon, hands: 2, ammunition: Some(Arrow)),
                    (id: 3, name: "Arrows", kind: Ammunition, ammunition: Some(Arrow)),
                ],
            )"#,
        )
        .unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].hands, 1);
        assert_eq!(items[0].break_chance, 5);
        assert!(items[1].is_two_handed());
        assert_eq!(items[1].required_ammunition(), Some(AmmunitionType::Arrow));
        assert_eq!(items[2].kind, ItemKind::Ammunition);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = ItemLoader::parse(
            r#"#![enable(unwrap_newtypes)]
            (items: [
                (id: 4, name: "Axe", kind: CloseRangeWeapon),
                (id: 4, name: "Mace", kind: CloseRangeWeapon),
            ])"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Duplicate item id 4"));
    }

    #[test]
    fn rejects_the_empty_item_id() {
        assert!(ItemLoader::parse(
            r#"#![enable(unwrap_newtypes)]
            (items: [(id: 0, name: "Nothing", kind: Ammunition)])"#
        )
        .is_err());
    }
}
