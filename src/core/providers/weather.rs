//! Weather from an IP geolocation lookup plus the Open-Meteo forecast API.

use async_trait::async_trait;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use url::Url;

use super::WeatherProvider;
use crate::core::config::Config;
use crate::core::snapshot::WeatherSnapshot;
use crate::error::{BarstatError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherEndpoints {
    pub geolocation_url: String,
    pub forecast_url: String,
}

impl WeatherEndpoints {
    pub fn from_config(config: &Config) -> Self {
        Self {
            geolocation_url: config.geolocation_url.clone(),
            forecast_url: config.forecast_url.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Location {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentConditions,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temperature_2m: f64,
    weather_code: i32,
}

pub struct OpenMeteoClient {
    client: reqwest::Client,
    endpoints: WeatherEndpoints,
    cache_path: PathBuf,
    cache_ttl: Duration,
}

impl OpenMeteoClient {
    pub fn new(endpoints: WeatherEndpoints, cache_path: PathBuf, cache_ttl: Duration) -> Self {
        Self::from_reqwest(reqwest::Client::new(), endpoints, cache_path, cache_ttl)
    }

    pub fn from_reqwest(
        client: reqwest::Client,
        endpoints: WeatherEndpoints,
        cache_path: PathBuf,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            client,
            endpoints,
            cache_path,
            cache_ttl,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .user_agent(concat!("barstat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BarstatError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::from_reqwest(
            client,
            WeatherEndpoints::from_config(config),
            config.weather_cache_file()?,
            config.weather_cache_ttl(),
        ))
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Returns the cached snapshot if the file is younger than the TTL.
    fn read_fresh_cache(&self) -> Option<WeatherSnapshot> {
        let metadata = fs::metadata(&self.cache_path).ok()?;
        let modified = metadata.modified().ok()?;
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or_default();

        if age >= self.cache_ttl {
            log::debug!("weather cache is {}s old, refetching", age.as_secs());
            return None;
        }

        let data = fs::read(&self.cache_path).ok()?;
        match serde_json::from_slice(&data) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                log::debug!("ignoring unreadable weather cache: {}", e);
                None
            }
        }
    }

    fn write_cache(&self, snapshot: &WeatherSnapshot) -> Result<()> {
        if let Some(parent) = self.cache_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let data = serde_json::to_vec(snapshot)
            .map_err(|e| BarstatError::decoding_failed(e.to_string()))?;
        fs::write(&self.cache_path, data)?;
        Ok(())
    }

    async fn locate(&self) -> Result<Location> {
        let url = Url::parse(&self.endpoints.geolocation_url)
            .map_err(|e| BarstatError::invalid_url(format!("{}: {}", self.endpoints.geolocation_url, e)))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BarstatError::location_detection_failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BarstatError::location_detection_failed(format!(
                "geolocation returned status {}",
                response.status()
            )));
        }

        response
            .json::<Location>()
            .await
            .map_err(|e| BarstatError::location_detection_failed(e.to_string()))
    }

    async fn forecast(&self, location: &Location) -> Result<WeatherSnapshot> {
        let mut url = Url::parse(&self.endpoints.forecast_url)
            .map_err(|e| BarstatError::invalid_url(format!("{}: {}", self.endpoints.forecast_url, e)))?;

        url.query_pairs_mut()
            .append_pair("latitude", &location.latitude.to_string())
            .append_pair("longitude", &location.longitude.to_string())
            .append_pair("current", "temperature_2m,weather_code");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BarstatError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BarstatError::network(format!(
                "forecast returned status {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| BarstatError::network(e.to_string()))?;

        let forecast: ForecastResponse = serde_json::from_str(&body)
            .map_err(|e| BarstatError::decoding_failed(e.to_string()))?;

        Ok(WeatherSnapshot::new(
            forecast.current.temperature_2m,
            forecast.current.weather_code,
        ))
    }

    /// Network fetch; the result overwrites the cache file.
    async fn fetch_and_store(&self) -> Result<WeatherSnapshot> {
        let location = self.locate().await?;
        log::debug!(
            "located at lat={:.2} lon={:.2}",
            location.latitude,
            location.longitude
        );

        let snapshot = self.forecast(&location).await?;

        if let Err(e) = self.write_cache(&snapshot) {
            log::warn!("Failed to write weather cache: {}", e);
        }

        Ok(snapshot)
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    async fn current_weather(&self) -> Result<WeatherSnapshot> {
        if let Some(cached) = self.read_fresh_cache() {
            log::debug!("weather served from {}", self.cache_path.display());
            return Ok(cached);
        }

        self.fetch_and_store().await
    }

    async fn refresh_weather(&self) -> Result<WeatherSnapshot> {
        self.fetch_and_store().await
    }
}
