use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;

use super::build_runtime;
use crate::core::{AppProcessManager, Config};
use crate::core::providers::SystemAppLister;
use std::sync::Arc;

fn manager(config: &Config) -> AppProcessManager {
    AppProcessManager::new(Arc::new(SystemAppLister::new(config.app_deny_list.clone())))
}

pub fn execute_list(_matches: &ArgMatches) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let runtime = build_runtime()?;

    runtime.block_on(async {
        let manager = manager(&config);
        manager.refresh().await?;

        for app in manager.apps() {
            println!(
                "{:>7}  {}  {}",
                app.pid.to_string().dimmed(),
                app.name.bold(),
                app.bundle_identifier.as_deref().unwrap_or("-").dimmed()
            );
        }
        println!("{} apps", manager.app_count());
        Ok::<(), anyhow::Error>(())
    })
}

pub fn execute_quit(matches: &ArgMatches) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let quit_all = matches.get_flag("all");
    let bundle_identifier = matches.get_one::<String>("bundle-id").cloned();
    let runtime = build_runtime()?;

    runtime.block_on(async {
        let manager = manager(&config);
        manager.refresh().await?;

        if quit_all {
            manager
                .quit_all()
                .await
                .context("Quit all stopped early")?;
            println!("{}", "All apps asked to quit".green());
            return Ok(());
        }

        let bundle_identifier =
            bundle_identifier.context("Pass a bundle identifier or --all")?;
        let app = manager
            .apps()
            .into_iter()
            .find(|app| app.bundle_identifier.as_deref() == Some(bundle_identifier.as_str()))
            .with_context(|| format!("{} is not running", bundle_identifier))?;

        manager.quit(&app).await?;
        println!("{} {}", "Asked to quit:".green(), app.name.bold());
        Ok::<(), anyhow::Error>(())
    })
}
