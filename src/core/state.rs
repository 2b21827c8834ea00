use serde::Serialize;
use std::sync::Arc;

use super::apps::AppProcessManager;
use super::config::Config;
use super::power::PowerAssertionController;
use super::providers::{
    CaffeinateProvider, KernelCpuReader, OpenMeteoClient, SysinfoNetworkReader,
    SysinfoStorageReader, SystemAppLister, SystemRamReader,
};
use super::sampler::{StatsSampler, WeatherSampler};
use super::snapshot::{CaffeinateState, StatsSnapshot, WeatherSnapshot};
use crate::error::Result;

/// Everything the menu bar shows, owned in one place.
///
/// Built once at startup and handed to whoever renders or drives it.
pub struct MenuBarState {
    pub stats: Arc<StatsSampler>,
    pub weather: Arc<WeatherSampler>,
    pub power: Arc<PowerAssertionController>,
    pub apps: Arc<AppProcessManager>,
}

/// Point-in-time copy of [`MenuBarState`] for display.
#[derive(Debug, Clone, Serialize)]
pub struct MenuBarView {
    pub timestamp: i64,
    pub stats: Option<StatsSnapshot>,
    pub weather: Option<WeatherSnapshot>,
    pub caffeinate: CaffeinateState,
    pub app_count: usize,
}

impl MenuBarState {
    pub fn new(
        stats: StatsSampler,
        weather: WeatherSampler,
        power: PowerAssertionController,
        apps: AppProcessManager,
    ) -> Self {
        Self {
            stats: Arc::new(stats),
            weather: Arc::new(weather),
            power: Arc::new(power),
            apps: Arc::new(apps),
        }
    }

    /// Wires the OS-backed providers. Needs a running Tokio runtime.
    pub fn from_config(config: &Config) -> Result<Self> {
        let stats = StatsSampler::new(
            Arc::new(KernelCpuReader::new()),
            Arc::new(SystemRamReader::new()),
            Arc::new(SysinfoNetworkReader::new(
                config.network_interface_prefixes.clone(),
            )),
            Arc::new(SysinfoStorageReader::new(config.storage_mount_path.clone())),
        )
        .with_storage_ttl(config.storage_cache_ttl());

        let weather = WeatherSampler::new(Arc::new(OpenMeteoClient::from_config(config)?))
            .with_ttl(config.weather_cache_ttl());

        let power = PowerAssertionController::new(Arc::new(CaffeinateProvider::from_config(config)));
        let apps = AppProcessManager::new(Arc::new(SystemAppLister::new(config.app_deny_list.clone())));

        Ok(Self::new(stats, weather, power, apps))
    }

    pub fn view(&self) -> MenuBarView {
        MenuBarView {
            timestamp: chrono::Utc::now().timestamp(),
            stats: self.stats.current_snapshot(),
            weather: self.weather.current_weather(),
            caffeinate: self.power.state(),
            app_count: self.apps.app_count(),
        }
    }
}
