//! Resource providers.
//!
//! Each provider wraps exactly one OS or network facility behind a narrow
//! async trait, so samplers and managers can run against test doubles.

mod apps;
mod cpu;
mod network;
mod power;
mod ram;
mod storage;
mod weather;

pub use apps::{parse_bundle_identifier, SystemAppLister};
pub use cpu::{CpuTicks, CpuTickSource, KernelCpuReader, KernelTickSource, TickDeltaCpuReader};
pub use network::{RateTracker, SysinfoNetworkReader};
pub use power::CaffeinateProvider;
pub use ram::{used_from_page_counts, SystemRamReader};
pub use storage::{select_disk, used_from_available, SysinfoStorageReader};
pub use weather::{OpenMeteoClient, WeatherEndpoints};

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::watch;

use crate::core::snapshot::{AppProcess, WeatherSnapshot};
use crate::error::Result;

#[async_trait]
pub trait CpuReader: Send + Sync {
    /// Busy share of CPU time since the previous call, in `[0, 100]`.
    async fn cpu_percentage(&self) -> Result<f64>;
}

#[async_trait]
pub trait RamReader: Send + Sync {
    /// `(used, total)` in bytes
    async fn ram_usage(&self) -> Result<(u64, u64)>;
}

#[async_trait]
pub trait NetworkReader: Send + Sync {
    /// `(download, upload)` in bytes per second
    async fn network_speed(&self) -> Result<(u64, u64)>;
}

#[async_trait]
pub trait StorageReader: Send + Sync {
    /// `(used, total)` in bytes
    async fn storage_usage(&self) -> Result<(u64, u64)>;
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current_weather(&self) -> Result<WeatherSnapshot>;

    /// Fetches past any cache the provider keeps of its own.
    async fn refresh_weather(&self) -> Result<WeatherSnapshot> {
        self.current_weather().await
    }
}

#[async_trait]
pub trait AppLister: Send + Sync {
    async fn running_apps(&self) -> Result<Vec<AppProcess>>;

    async fn quit_app(&self, bundle_identifier: &str) -> Result<()>;
}

#[async_trait]
pub trait PowerAssertionProvider: Send + Sync {
    /// Starts a sleep-prevention assertion; `None` keeps it until deactivated.
    async fn activate(&self, duration: Option<Duration>) -> Result<()>;

    async fn deactivate(&self) -> Result<()>;

    fn is_active(&self) -> bool;

    /// Flips to `false` whenever the assertion ends, including on its own.
    fn activity(&self) -> watch::Receiver<bool>;
}
