use async_trait::async_trait;
use barstat::core::providers::{
    AppLister, CpuReader, NetworkReader, PowerAssertionProvider, RamReader, StorageReader,
    WeatherProvider,
};
use barstat::core::{
    AppProcess, AppProcessManager, CaffeinateState, MenuBarState, PowerAssertionController,
    SamplingRuntime, StatsSampler, WeatherSampler, WeatherSnapshot,
};
use barstat::Result;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

struct CountingCpu(AtomicUsize);

#[async_trait]
impl CpuReader for CountingCpu {
    async fn cpu_percentage(&self) -> Result<f64> {
        let n = self.0.fetch_add(1, Ordering::SeqCst);
        Ok(n as f64)
    }
}

struct Ram;

#[async_trait]
impl RamReader for Ram {
    async fn ram_usage(&self) -> Result<(u64, u64)> {
        Ok((4, 8))
    }
}

struct Network;

#[async_trait]
impl NetworkReader for Network {
    async fn network_speed(&self) -> Result<(u64, u64)> {
        Ok((0, 0))
    }
}

struct Storage;

#[async_trait]
impl StorageReader for Storage {
    async fn storage_usage(&self) -> Result<(u64, u64)> {
        Ok((1, 2))
    }
}

struct CountingWeather(AtomicUsize);

#[async_trait]
impl WeatherProvider for CountingWeather {
    async fn current_weather(&self) -> Result<WeatherSnapshot> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(WeatherSnapshot::new(16.0, 1))
    }
}

struct Apps;

#[async_trait]
impl AppLister for Apps {
    async fn running_apps(&self) -> Result<Vec<AppProcess>> {
        Ok(vec![AppProcess {
            id: "com.example.Editor".to_string(),
            name: "Editor".to_string(),
            bundle_identifier: Some("com.example.Editor".to_string()),
            pid: 501,
        }])
    }

    async fn quit_app(&self, _bundle_identifier: &str) -> Result<()> {
        Ok(())
    }
}

struct Power {
    active: AtomicBool,
    activity_tx: watch::Sender<bool>,
}

#[async_trait]
impl PowerAssertionProvider for Power {
    async fn activate(&self, _duration: Option<Duration>) -> Result<()> {
        self.active.store(true, Ordering::SeqCst);
        self.activity_tx.send_replace(true);
        Ok(())
    }

    async fn deactivate(&self) -> Result<()> {
        self.active.store(false, Ordering::SeqCst);
        self.activity_tx.send_replace(false);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn activity(&self) -> watch::Receiver<bool> {
        self.activity_tx.subscribe()
    }
}

struct Fixture {
    state: MenuBarState,
    cpu: Arc<CountingCpu>,
    weather: Arc<CountingWeather>,
}

fn fixture() -> Fixture {
    let cpu = Arc::new(CountingCpu(AtomicUsize::new(0)));
    let weather = Arc::new(CountingWeather(AtomicUsize::new(0)));
    let (activity_tx, _) = watch::channel(false);

    let state = MenuBarState::new(
        StatsSampler::new(cpu.clone(), Arc::new(Ram), Arc::new(Network), Arc::new(Storage)),
        WeatherSampler::new(weather.clone()),
        PowerAssertionController::new(Arc::new(Power {
            active: AtomicBool::new(false),
            activity_tx,
        })),
        AppProcessManager::new(Arc::new(Apps)),
    );

    Fixture {
        state,
        cpu,
        weather,
    }
}

#[tokio::test(start_paused = true)]
async fn test_stats_and_weather_tick_independently() {
    let fx = fixture();
    let sampling = SamplingRuntime::start(&fx.state, Duration::from_secs(1), Duration::from_secs(900));

    // First ticks fire immediately, then stats every second
    tokio::time::sleep(Duration::from_millis(3_500)).await;

    assert_eq!(fx.cpu.0.load(Ordering::SeqCst), 4);
    assert_eq!(fx.weather.0.load(Ordering::SeqCst), 1);
    assert_eq!(fx.state.stats.current_snapshot().unwrap().cpu_percentage, 3.0);
    assert_eq!(fx.state.weather.current_weather().unwrap().temperature, 16.0);

    sampling.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_sampling() {
    let fx = fixture();
    let sampling = SamplingRuntime::start(&fx.state, Duration::from_secs(1), Duration::from_secs(900));

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    sampling.shutdown().await;
    let samples = fx.cpu.0.load(Ordering::SeqCst);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(fx.cpu.0.load(Ordering::SeqCst), samples);
}

#[tokio::test(start_paused = true)]
async fn test_view_aggregates_all_components() {
    let fx = fixture();

    let view = fx.state.view();
    assert!(view.stats.is_none());
    assert!(view.weather.is_none());
    assert_eq!(view.caffeinate, CaffeinateState::Inactive);
    assert_eq!(view.app_count, 0);

    fx.state.stats.sample().await;
    fx.state.weather.sample().await;
    fx.state.apps.refresh().await.unwrap();
    fx.state.power.keep_awake_indefinitely().await.unwrap();

    let view = fx.state.view();
    assert_eq!(view.stats.unwrap().ram_percentage(), 50.0);
    assert_eq!(view.weather.unwrap().condition_code, 1);
    assert_eq!(view.caffeinate, CaffeinateState::Indefinite);
    assert_eq!(view.app_count, 1);

    let json = serde_json::to_value(&view).unwrap();
    assert!(json.get("stats").is_some());
    assert!(json.get("app_count").is_some());
}
