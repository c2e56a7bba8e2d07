//! Terminal client: plays one encounter with the automatic party policy.
mod config;
mod logging;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use battle_content::ContentFactory;
use battle_core::BattleEndInfo;
use battle_runtime::{
    AutoPartyProvider, BattleRuntime, OracleManager, RoundReport, RoundStatus, RuntimeConfig,
};
use config::CliConfig;

/// Rounds after which the client gives up on a battle.
const MAX_ROUNDS: usize = 500;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = CliConfig::from_env();
    let _guard = logging::init(config.log_dir.as_deref())?;

    let factory = ContentFactory::new(&config.data_dir);
    let oracles = OracleManager::from_content(&factory)?;
    let setup = factory
        .load_setup(&config.encounter)
        .with_context(|| format!("loading encounter `{}`", config.encounter))?;
    let runtime_config = RuntimeConfig::from_env(factory.load_config()?);

    let mut runtime = BattleRuntime::builder()
        .config(runtime_config)
        .setup(setup)
        .oracles(oracles.clone())
        .party_provider(AutoPartyProvider::new(oracles.items()))
        .build()
        .await?;

    println!("== {} ==", config.encounter);
    let end = play(&mut runtime).await?;
    runtime.shutdown().await?;

    if config.json_summary {
        println!("{}", serde_json::to_string_pretty(&end)?);
    } else {
        print_summary(&end);
    }
    Ok(())
}

async fn play(runtime: &mut BattleRuntime) -> Result<BattleEndInfo> {
    let handle = runtime.handle();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    for _ in 0..MAX_ROUNDS {
        let mut report = runtime.step().await?;
        println!("-- round {} --", handle.snapshot().await?.round);
        loop {
            print_messages(&report);
            match report.status {
                RoundStatus::Ended(end) => return Ok(end),
                RoundStatus::Finished { .. } => break,
                RoundStatus::AwaitingClick => {
                    // Enter acknowledges; a closed stdin keeps clicking.
                    let _ = stdin.next_line().await?;
                    report = handle.click().await?;
                }
            }
        }
    }
    anyhow::bail!("battle did not end within {MAX_ROUNDS} rounds")
}

fn print_messages(report: &RoundReport) {
    for line in &report.messages {
        println!("{line}");
    }
}

fn print_summary(end: &BattleEndInfo) {
    if end.monsters_defeated {
        println!("Victory. {} experience.", end.total_experience);
    } else {
        println!("The party lost the battle.");
    }
    if !end.broken_items.is_empty() {
        println!("{} item(s) broke.", end.broken_items.len());
    }
}
