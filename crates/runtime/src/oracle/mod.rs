//! Runtime wrappers around static battle content.
//!
//! These implementations expose `battle-core` oracle traits and bundle them
//! into an [`OracleManager`] so the runtime can build a [`BattleEnv`] for
//! each battle. The data is immutable at runtime; dynamic state lives in the
//! battle itself.
mod items;
mod spells;

use std::sync::Arc;

use battle_content::ContentFactory;
use battle_core::{BattleEnv, PcgRng, RngOracle};

pub use items::ItemOracleImpl;
pub use spells::SpellOracleImpl;

use crate::api::Result;

/// Manages all oracle implementations and provides unified access
#[derive(Clone)]
pub struct OracleManager {
    pub(crate) items: Arc<ItemOracleImpl>,
    pub(crate) spells: Arc<SpellOracleImpl>,
}

impl OracleManager {
    pub fn new(items: Arc<ItemOracleImpl>, spells: Arc<SpellOracleImpl>) -> Self {
        Self { items, spells }
    }

    /// Items and spell overrides from a content directory.
    pub fn from_content(factory: &ContentFactory) -> Result<Self> {
        let items = ItemOracleImpl::from_definitions(factory.load_items()?);
        let spells = SpellOracleImpl::new(factory.load_spells()?);
        tracing::debug!(items = items.len(), "oracles loaded");
        Ok(Self::new(Arc::new(items), Arc::new(spells)))
    }

    /// Environment for one battle, drawing from a seeded generator.
    pub fn battle_env(&self, seed: u64) -> BattleEnv {
        self.battle_env_with(Box::new(PcgRng::new(seed)))
    }

    pub fn battle_env_with(&self, rng: Box<dyn RngOracle>) -> BattleEnv {
        BattleEnv::new(self.items.clone(), self.spells.clone(), rng)
    }

    pub fn items(&self) -> Arc<ItemOracleImpl> {
        Arc::clone(&self.items)
    }
}
