use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::core::providers::WeatherProvider;
use crate::core::snapshot::WeatherSnapshot;

pub const WEATHER_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone, Copy)]
struct WeatherCache {
    snapshot: WeatherSnapshot,
    stored_at: Instant,
}

/// Wraps a [`WeatherProvider`] with an in-memory TTL cache.
///
/// Provider errors never escape: the last good value stays current, or the
/// placeholder is shown if nothing has been fetched yet.
pub struct WeatherSampler {
    provider: Arc<dyn WeatherProvider>,
    ttl: Duration,
    cache: Mutex<Option<WeatherCache>>,
    weather_tx: watch::Sender<Option<WeatherSnapshot>>,
}

impl WeatherSampler {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        let (weather_tx, _) = watch::channel(None);

        Self {
            provider,
            ttl: WEATHER_CACHE_TTL,
            cache: Mutex::new(None),
            weather_tx,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn cached(&self) -> Option<WeatherCache> {
        self.cache.lock().ok().and_then(|cache| *cache)
    }

    pub async fn sample(&self) {
        if let Some(cache) = self.cached() {
            if cache.stored_at.elapsed() < self.ttl {
                self.weather_tx.send_replace(Some(cache.snapshot));
                return;
            }
        }

        self.fetch(false).await;
    }

    /// Fetches from the provider, bypassing both this cache and the provider's.
    pub async fn refresh(&self) {
        self.fetch(true).await;
    }

    async fn fetch(&self, bypass_provider_cache: bool) {
        let result = if bypass_provider_cache {
            self.provider.refresh_weather().await
        } else {
            self.provider.current_weather().await
        };

        match result {
            Ok(snapshot) => {
                if let Ok(mut cache) = self.cache.lock() {
                    *cache = Some(WeatherCache {
                        snapshot,
                        stored_at: Instant::now(),
                    });
                }
                log::debug!(
                    "weather {:.1}°C code {}",
                    snapshot.temperature,
                    snapshot.condition_code
                );
                self.weather_tx.send_replace(Some(snapshot));
            }
            Err(e) => {
                log::warn!("Weather fetch failed: {}", e);
                if self.cached().is_none() {
                    self.weather_tx.send_if_modified(|current| {
                        if current.is_some() {
                            return false;
                        }
                        *current = Some(WeatherSnapshot::placeholder());
                        true
                    });
                }
            }
        }
    }

    pub fn current_weather(&self) -> Option<WeatherSnapshot> {
        *self.weather_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<WeatherSnapshot>> {
        self.weather_tx.subscribe()
    }
}
