use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::core::providers::{CpuReader, NetworkReader, RamReader, StorageReader};
use crate::core::snapshot::StatsSnapshot;
use crate::error::Result;

pub const STORAGE_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Used when storage has never been read successfully; total 1 keeps the
/// percentage math finite.
const STORAGE_FALLBACK: (u64, u64) = (0, 1);

#[derive(Debug, Clone, Copy)]
struct StorageCache {
    used: u64,
    total: u64,
    stored_at: Instant,
}

/// Combines the CPU, RAM and network readers (read every tick) with a
/// TTL-cached storage reader into one [`StatsSnapshot`].
pub struct StatsSampler {
    cpu: Arc<dyn CpuReader>,
    ram: Arc<dyn RamReader>,
    network: Arc<dyn NetworkReader>,
    storage: Arc<dyn StorageReader>,
    storage_ttl: Duration,
    storage_cache: Mutex<Option<StorageCache>>,
    is_sampling: AtomicBool,
    snapshot_tx: watch::Sender<Option<StatsSnapshot>>,
}

impl StatsSampler {
    pub fn new(
        cpu: Arc<dyn CpuReader>,
        ram: Arc<dyn RamReader>,
        network: Arc<dyn NetworkReader>,
        storage: Arc<dyn StorageReader>,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(None);

        Self {
            cpu,
            ram,
            network,
            storage,
            storage_ttl: STORAGE_CACHE_TTL,
            storage_cache: Mutex::new(None),
            is_sampling: AtomicBool::new(false),
            snapshot_tx,
        }
    }

    pub fn with_storage_ttl(mut self, ttl: Duration) -> Self {
        self.storage_ttl = ttl;
        self
    }

    /// Takes one sample and publishes it as the current snapshot.
    ///
    /// A CPU, RAM or network failure drops the whole sample and keeps the
    /// previous snapshot. Storage failures fall back to the last cached value.
    pub async fn sample(&self) {
        self.is_sampling.store(true, Ordering::SeqCst);

        match self.collect().await {
            Ok(snapshot) => {
                log::trace!("stats sample {:?}", snapshot);
                self.snapshot_tx.send_replace(Some(snapshot));
            }
            Err(e) => log::warn!("Stats sample discarded: {}", e),
        }

        self.is_sampling.store(false, Ordering::SeqCst);
    }

    async fn collect(&self) -> Result<StatsSnapshot> {
        let (readings, storage) = tokio::join!(
            async {
                tokio::try_join!(
                    self.cpu.cpu_percentage(),
                    self.ram.ram_usage(),
                    self.network.network_speed(),
                )
            },
            self.storage_usage(),
        );
        let (cpu, (ram_used, ram_total), (download, upload)) = readings?;
        let (storage_used, storage_total) = storage;

        Ok(StatsSnapshot {
            cpu_percentage: cpu,
            ram_used,
            ram_total,
            storage_used,
            storage_total,
            network_download_bps: download,
            network_upload_bps: upload,
        })
    }

    fn cached_storage(&self) -> Option<StorageCache> {
        self.storage_cache.lock().ok().and_then(|cache| *cache)
    }

    async fn storage_usage(&self) -> (u64, u64) {
        let cached = self.cached_storage();

        if let Some(cache) = cached {
            if cache.stored_at.elapsed() < self.storage_ttl {
                return (cache.used, cache.total);
            }
        }

        match self.storage.storage_usage().await {
            Ok((used, total)) => {
                if let Ok(mut cache) = self.storage_cache.lock() {
                    *cache = Some(StorageCache {
                        used,
                        total,
                        stored_at: Instant::now(),
                    });
                }
                (used, total)
            }
            Err(e) => {
                log::warn!("Storage read failed, using cached value: {}", e);
                cached
                    .map(|cache| (cache.used, cache.total))
                    .unwrap_or(STORAGE_FALLBACK)
            }
        }
    }

    /// Forces a fresh storage read on the next sample.
    pub fn invalidate_storage_cache(&self) {
        if let Ok(mut cache) = self.storage_cache.lock() {
            *cache = None;
        }
    }

    pub fn is_sampling(&self) -> bool {
        self.is_sampling.load(Ordering::SeqCst)
    }

    pub fn current_snapshot(&self) -> Option<StatsSnapshot> {
        *self.snapshot_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<StatsSnapshot>> {
        self.snapshot_tx.subscribe()
    }
}
