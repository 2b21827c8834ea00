use async_trait::async_trait;
use barstat::core::providers::WeatherProvider;
use barstat::core::{WeatherSampler, WeatherSnapshot};
use barstat::{BarstatError, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Replays scripted results in order, failing once the script runs out.
struct ScriptedWeather {
    calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    script: Mutex<VecDeque<Result<WeatherSnapshot>>>,
}

impl ScriptedWeather {
    fn new(script: Vec<Result<WeatherSnapshot>>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            script: Mutex::new(script.into()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherProvider for ScriptedWeather {
    async fn current_weather(&self) -> Result<WeatherSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BarstatError::network("script exhausted")))
    }

    async fn refresh_weather(&self) -> Result<WeatherSnapshot> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.current_weather().await
    }
}

fn offline() -> Result<WeatherSnapshot> {
    Err(BarstatError::network("offline"))
}

#[tokio::test]
async fn test_sample_publishes_fetched_weather() {
    let provider = ScriptedWeather::new(vec![Ok(WeatherSnapshot::new(21.5, 3))]);
    let sampler = WeatherSampler::new(provider.clone());

    assert!(sampler.current_weather().is_none());
    sampler.sample().await;

    let weather = sampler.current_weather().unwrap();
    assert_eq!(weather.temperature, 21.5);
    assert_eq!(weather.condition_code, 3);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_sample_within_ttl_uses_cache() {
    let provider = ScriptedWeather::new(vec![
        Ok(WeatherSnapshot::new(10.0, 0)),
        Ok(WeatherSnapshot::new(30.0, 61)),
    ]);
    let sampler = WeatherSampler::new(provider.clone());

    sampler.sample().await;
    tokio::time::advance(Duration::from_secs(14 * 60)).await;
    sampler.sample().await;

    assert_eq!(provider.calls(), 1);
    assert_eq!(sampler.current_weather().unwrap().temperature, 10.0);
}

#[tokio::test(start_paused = true)]
async fn test_sample_after_ttl_refetches() {
    let provider = ScriptedWeather::new(vec![
        Ok(WeatherSnapshot::new(10.0, 0)),
        Ok(WeatherSnapshot::new(30.0, 61)),
    ]);
    let sampler = WeatherSampler::new(provider.clone());

    sampler.sample().await;
    tokio::time::advance(Duration::from_secs(15 * 60 + 1)).await;
    sampler.sample().await;

    assert_eq!(provider.calls(), 2);
    let weather = sampler.current_weather().unwrap();
    assert_eq!(weather.temperature, 30.0);
    assert_eq!(weather.condition_code, 61);
}

#[tokio::test]
async fn test_refresh_bypasses_cache() {
    let provider = ScriptedWeather::new(vec![
        Ok(WeatherSnapshot::new(10.0, 0)),
        Ok(WeatherSnapshot::new(12.0, 2)),
    ]);
    let sampler = WeatherSampler::new(provider.clone());

    sampler.sample().await;
    sampler.refresh().await;

    assert_eq!(provider.calls(), 2);
    assert_eq!(provider.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(sampler.current_weather().unwrap().temperature, 12.0);
}

#[tokio::test]
async fn test_first_failure_shows_placeholder() {
    let provider = ScriptedWeather::new(vec![offline()]);
    let sampler = WeatherSampler::new(provider);

    sampler.sample().await;

    let weather = sampler.current_weather().unwrap();
    assert!(weather.is_placeholder());
    assert_eq!(weather.temperature, 0.0);
    assert_eq!(weather.condition_code, -1);
}

#[tokio::test]
async fn test_failure_keeps_last_good_weather() {
    let provider = ScriptedWeather::new(vec![Ok(WeatherSnapshot::new(18.0, 45)), offline()]);
    let sampler = WeatherSampler::new(provider.clone());

    sampler.sample().await;
    sampler.refresh().await;

    assert_eq!(provider.calls(), 2);
    let weather = sampler.current_weather().unwrap();
    assert!(!weather.is_placeholder());
    assert_eq!(weather.temperature, 18.0);
}

#[tokio::test]
async fn test_success_after_placeholder_replaces_it() {
    let provider = ScriptedWeather::new(vec![offline(), Ok(WeatherSnapshot::new(5.0, 71))]);
    let sampler = WeatherSampler::new(provider);

    sampler.sample().await;
    assert!(sampler.current_weather().unwrap().is_placeholder());

    sampler.sample().await;
    assert_eq!(sampler.current_weather().unwrap().condition_code, 71);
}
