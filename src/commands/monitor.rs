//! Headless monitor: drives both samplers on their timers and prints the
//! aggregate state.

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use super::{build_runtime, install_stop_flag};
use crate::core::{Config, MenuBarState, MenuBarView, SamplingRuntime};
use crate::ui::{format_caffeinate, format_stats_line, format_temperature};

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let interval_ms = matches
        .get_one::<u64>("interval")
        .copied()
        .unwrap_or(config.stats_interval_ms);
    let json_output = matches.get_flag("json");

    let running = install_stop_flag()?;
    let runtime = build_runtime()?;

    runtime.block_on(async {
        let state = MenuBarState::from_config(&config)?;
        if let Err(e) = state.apps.refresh().await {
            log::warn!("Could not list running apps: {}", e);
        }

        let sampling = SamplingRuntime::start(
            &state,
            Duration::from_millis(interval_ms.max(1)),
            config.weather_interval(),
        );

        let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms.max(1)));
        while running.load(Ordering::SeqCst) {
            ticker.tick().await;
            let view = state.view();
            if json_output {
                println!("{}", serde_json::to_string(&view)?);
            } else {
                print_view(&view);
            }
        }

        sampling.shutdown().await;
        if state.power.is_active() {
            state.power.allow_sleep().await?;
        }
        Ok::<(), anyhow::Error>(())
    })
}

fn print_view(view: &MenuBarView) {
    let stats = view
        .stats
        .as_ref()
        .map(format_stats_line)
        .unwrap_or_else(|| "sampling...".dimmed().to_string());

    let weather = view
        .weather
        .as_ref()
        .map(|w| format!("{} {}", format_temperature(w), w.icon().symbol_name()))
        .unwrap_or_else(|| "--".to_string());

    println!(
        "{}  {}  {}  {} apps",
        stats,
        weather.cyan(),
        format_caffeinate(&view.caffeinate, chrono::Utc::now()).yellow(),
        view.app_count
    );
}
