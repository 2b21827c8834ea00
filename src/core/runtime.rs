//! Timer-driven re-sampling.
//!
//! Stats and weather run as two independent interval tasks; neither waits
//! for the other.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::sampler::{StatsSampler, WeatherSampler};
use super::state::MenuBarState;

pub const STATS_INTERVAL: Duration = Duration::from_secs(1);
pub const WEATHER_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Handle to the running sampling tasks.
pub struct SamplingRuntime {
    shutdown_tx: broadcast::Sender<()>,
    handles: Vec<JoinHandle<()>>,
}

impl SamplingRuntime {
    /// Spawns the sampling tasks on the current Tokio runtime.
    pub fn start(state: &MenuBarState, stats_every: Duration, weather_every: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel::<()>(1);

        let handles = vec![
            tokio::spawn(stats_task(
                Arc::clone(&state.stats),
                stats_every,
                shutdown_tx.subscribe(),
            )),
            tokio::spawn(weather_task(
                Arc::clone(&state.weather),
                weather_every,
                shutdown_tx.subscribe(),
            )),
        ];

        log::info!(
            "sampling started (stats every {:?}, weather every {:?})",
            stats_every,
            weather_every
        );

        Self {
            shutdown_tx,
            handles,
        }
    }

    /// Signals every task to stop and waits for them.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        for handle in self.handles {
            if let Err(e) = handle.await {
                log::warn!("sampling task ended abnormally: {}", e);
            }
        }
        log::info!("sampling stopped");
    }
}

async fn stats_task(
    sampler: Arc<StatsSampler>,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => sampler.sample().await,
            _ = shutdown.recv() => break,
        }
    }
}

async fn weather_task(
    sampler: Arc<WeatherSampler>,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => sampler.sample().await,
            _ = shutdown.recv() => break,
        }
    }
}
