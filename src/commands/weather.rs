use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;

use super::build_runtime;
use crate::core::{Config, MenuBarState};
use crate::ui::format_temperature;

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let refresh = matches.get_flag("refresh");
    let runtime = build_runtime()?;

    runtime.block_on(async {
        let state = MenuBarState::from_config(&config)?;

        if refresh {
            state.weather.refresh().await;
        } else {
            state.weather.sample().await;
        }

        let weather = state
            .weather
            .current_weather()
            .context("No weather available")?;

        if weather.is_placeholder() {
            println!("{}", "Weather unavailable (see log for details)".yellow());
        } else {
            println!(
                "{} {} (code {})",
                format_temperature(&weather).bold(),
                weather.icon().symbol_name(),
                weather.condition_code
            );
        }
        Ok::<(), anyhow::Error>(())
    })
}
