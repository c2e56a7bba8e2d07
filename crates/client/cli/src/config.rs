//! Command-line configuration read from the environment.

use std::env;
use std::path::PathBuf;

const DEFAULT_DATA_DIR: &str = "crates/battle/content/data";
const DEFAULT_ENCOUNTER: &str = "crossroads";

#[derive(Clone, Debug)]
pub struct CliConfig {
    pub data_dir: PathBuf,
    pub encounter: String,
    /// Directory for `battle.log`; stderr only when unset.
    pub log_dir: Option<PathBuf>,
    /// Print the end summary as JSON instead of prose.
    pub json_summary: bool,
}

impl CliConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `BATTLE_DATA_DIR` - content directory (default: crates/battle/content/data)
    /// - `BATTLE_ENCOUNTER` - encounter file name, overridden by the first argument
    /// - `BATTLE_LOG_DIR` - also write logs to this directory
    /// - `BATTLE_SUMMARY_JSON` - print the summary as JSON (default: false)
    pub fn from_env() -> Self {
        let encounter = env::args()
            .nth(1)
            .or_else(|| env::var("BATTLE_ENCOUNTER").ok())
            .unwrap_or_else(|| DEFAULT_ENCOUNTER.to_string());

        Self {
            data_dir: env::var_os("BATTLE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            encounter,
            log_dir: env::var_os("BATTLE_LOG_DIR").map(PathBuf::from),
            json_summary: read_env_bool("BATTLE_SUMMARY_JSON").unwrap_or(false),
        }
    }
}

fn read_env_bool(key: &str) -> Option<bool> {
    match env::var(key).ok()?.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
