use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use super::{build_runtime, install_stop_flag};
use crate::core::providers::CaffeinateProvider;
use crate::core::{Config, PowerAssertionController};
use crate::ui::format_caffeinate;

fn awake_duration(minutes: u64) -> Duration {
    Duration::from_secs(minutes.saturating_mul(60))
}

/// Keeps the machine awake while this command runs in the foreground.
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let minutes = matches.get_one::<u64>("minutes").copied();
    let running = install_stop_flag()?;
    let runtime = build_runtime()?;

    runtime.block_on(async {
        let controller =
            PowerAssertionController::new(Arc::new(CaffeinateProvider::from_config(&config)));

        match minutes {
            Some(minutes) => controller.keep_awake(awake_duration(minutes)).await?,
            None => controller.keep_awake_indefinitely().await?,
        }

        println!(
            "{} {}",
            format_caffeinate(&controller.state(), chrono::Utc::now()).green(),
            "(Ctrl+C to allow sleep)".dimmed()
        );

        while running.load(Ordering::SeqCst) && controller.is_active() {
            tokio::time::sleep(Duration::from_millis(250)).await;
        }

        controller.allow_sleep().await?;
        println!("{}", "Sleep allowed".yellow());
        Ok::<(), anyhow::Error>(())
    })
}
