use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{BarstatError, Result};

pub const DEFAULT_GEOLOCATION_URL: &str = "https://ipapi.co/json/";
pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Bundle identifiers of system menu extras that never show up as apps.
pub const DEFAULT_APP_DENY_LIST: &[&str] = &[
    "com.apple.controlcenter",
    "com.apple.systemuiserver",
    "com.apple.Spotlight",
    "com.apple.notificationcenterui",
    "com.apple.TextInputMenuAgent",
    "com.apple.dock",
    "com.apple.WindowManager",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub stats_interval_ms: u64,
    pub weather_interval_secs: u64,
    pub storage_cache_ttl_secs: u64,
    pub weather_cache_ttl_secs: u64,
    /// Filesystem whose usage is reported
    pub storage_mount_path: PathBuf,
    /// Interfaces counted for throughput, matched by name prefix
    pub network_interface_prefixes: Vec<String>,
    pub geolocation_url: String,
    pub forecast_url: String,
    /// Overrides `<cache_dir>/barstat/weather.json`
    pub weather_cache_path: Option<PathBuf>,
    pub http_timeout_secs: u64,
    pub caffeinate_command: String,
    pub caffeinate_args: Vec<String>,
    pub app_deny_list: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stats_interval_ms: 1000,
            weather_interval_secs: 15 * 60,
            storage_cache_ttl_secs: 5 * 60,
            weather_cache_ttl_secs: 15 * 60,
            storage_mount_path: PathBuf::from("/"),
            network_interface_prefixes: vec!["en".to_string(), "bridge".to_string()],
            geolocation_url: DEFAULT_GEOLOCATION_URL.to_string(),
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
            weather_cache_path: None,
            http_timeout_secs: 10,
            caffeinate_command: "caffeinate".to_string(),
            caffeinate_args: vec!["-d".to_string(), "-i".to_string()],
            app_deny_list: DEFAULT_APP_DENY_LIST.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Config {
    /// Load from the user config directory, falling back to defaults.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let data = fs::read(path)?;
        if data.is_empty() {
            return Ok(Config::default());
        }

        match serde_json::from_slice(&data) {
            Ok(config) => Ok(config),
            Err(e) => {
                log::warn!(
                    "Ignoring unreadable config file {}: {}",
                    path.display(),
                    e
                );
                Ok(Config::default())
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let data = serde_json::to_vec_pretty(self)
            .map_err(|e| BarstatError::config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, data)?;

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| BarstatError::config("Could not determine config directory"))?;

        Ok(config_dir.join("barstat").join("config.json"))
    }

    /// Resolved weather cache file location
    pub fn weather_cache_file(&self) -> Result<PathBuf> {
        if let Some(path) = &self.weather_cache_path {
            return Ok(path.clone());
        }

        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| BarstatError::config("Could not determine cache directory"))?;

        Ok(cache_dir.join("barstat").join("weather.json"))
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms.max(1))
    }

    pub fn weather_interval(&self) -> Duration {
        Duration::from_secs(self.weather_interval_secs.max(1))
    }

    pub fn storage_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.storage_cache_ttl_secs)
    }

    pub fn weather_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.weather_cache_ttl_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
