//! Battle configuration loader.

use std::path::Path;

use battle_core::BattleConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for [`BattleConfig`] from TOML files. Missing keys keep their
/// defaults.
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(path: &Path) -> LoadResult<BattleConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<BattleConfig> {
        let config: BattleConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_pacing_keys() {
        let config = ConfigLoader::parse(
            "needs_click_for_next_action = true\nmessage_delay_ticks = 30\n",
        )
        .unwrap();
        assert!(config.needs_click_for_next_action);
        assert_eq!(config.message_delay_ticks, 30);
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        assert_eq!(ConfigLoader::parse("").unwrap(), BattleConfig::default());
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(ConfigLoader::parse("message_delay_ticks = \"slow\"").is_err());
    }
}
