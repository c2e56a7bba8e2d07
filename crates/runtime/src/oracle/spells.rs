//! Spell table with data-driven overrides over the built-in one.
use std::collections::HashMap;

use battle_core::{Spell, SpellInfo, SpellOracle, StandardSpells};

#[derive(Default)]
pub struct SpellOracleImpl {
    overrides: HashMap<Spell, SpellInfo>,
}

impl SpellOracleImpl {
    pub fn new(overrides: impl IntoIterator<Item = SpellInfo>) -> Self {
        Self {
            overrides: overrides.into_iter().map(|info| (info.spell, info)).collect(),
        }
    }
}

impl SpellOracle for SpellOracleImpl {
    fn info(&self, spell: Spell) -> SpellInfo {
        self.overrides
            .get(&spell)
            .copied()
            .unwrap_or_else(|| StandardSpells::info(spell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::SpellTarget;

    #[test]
    fn overrides_win_over_the_standard_table() {
        let oracle = SpellOracleImpl::new([SpellInfo {
            spell: Spell::Fireball,
            target: SpellTarget::AllEnemies,
            sp_cost: 60,
            castable_by_monster: false,
        }]);

        assert_eq!(oracle.info(Spell::Fireball).sp_cost, 60);
        assert_eq!(oracle.info(Spell::Sleep), StandardSpells::info(Spell::Sleep));
    }
}
