use anyhow::{Context, Result};
use clap::ArgMatches;
use std::time::Duration;

use super::build_runtime;
use crate::core::Config;
use crate::core::MenuBarState;
use crate::ui::format_stats_line;

/// Prints one stats snapshot. Two samples are taken so CPU and network
/// report the interval between them rather than since boot.
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let json_output = matches.get_flag("json");
    let runtime = build_runtime()?;

    runtime.block_on(async {
        let state = MenuBarState::from_config(&config)?;

        state.stats.sample().await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        state.stats.sample().await;

        let snapshot = state
            .stats
            .current_snapshot()
            .context("No stats sample could be taken")?;

        if json_output {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        } else {
            println!("{}", format_stats_line(&snapshot));
        }
        Ok::<(), anyhow::Error>(())
    })
}
