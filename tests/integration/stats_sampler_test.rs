use async_trait::async_trait;
use barstat::core::providers::{CpuReader, NetworkReader, RamReader, StorageReader};
use barstat::core::StatsSampler;
use barstat::{BarstatError, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct FixedCpu {
    value: Mutex<f64>,
    fail: AtomicBool,
}

impl FixedCpu {
    fn new(value: f64) -> Arc<Self> {
        Arc::new(Self {
            value: Mutex::new(value),
            fail: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl CpuReader for FixedCpu {
    async fn cpu_percentage(&self) -> Result<f64> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BarstatError::read_failed("cpu", "scripted failure"));
        }
        Ok(*self.value.lock().unwrap())
    }
}

struct FixedRam(u64, u64);

#[async_trait]
impl RamReader for FixedRam {
    async fn ram_usage(&self) -> Result<(u64, u64)> {
        Ok((self.0, self.1))
    }
}

struct FixedNetwork(u64, u64);

#[async_trait]
impl NetworkReader for FixedNetwork {
    async fn network_speed(&self) -> Result<(u64, u64)> {
        Ok((self.0, self.1))
    }
}

/// Counts reads and returns whatever is currently scripted.
struct CountingStorage {
    reads: AtomicUsize,
    value: Mutex<Option<(u64, u64)>>,
}

impl CountingStorage {
    fn new(value: Option<(u64, u64)>) -> Arc<Self> {
        Arc::new(Self {
            reads: AtomicUsize::new(0),
            value: Mutex::new(value),
        })
    }

    fn set(&self, value: Option<(u64, u64)>) {
        *self.value.lock().unwrap() = value;
    }

    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageReader for CountingStorage {
    async fn storage_usage(&self) -> Result<(u64, u64)> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.value
            .lock()
            .unwrap()
            .ok_or_else(|| BarstatError::read_failed("storage", "volume unavailable"))
    }
}

fn sampler(cpu: Arc<FixedCpu>, storage: Arc<CountingStorage>) -> StatsSampler {
    StatsSampler::new(
        cpu,
        Arc::new(FixedRam(10_000_000_000, 16_000_000_000)),
        Arc::new(FixedNetwork(1_500, 250)),
        storage,
    )
}

#[tokio::test]
async fn test_sample_combines_all_readers() {
    let storage = CountingStorage::new(Some((200_000_000_000, 500_000_000_000)));
    let sampler = sampler(FixedCpu::new(65.5), storage);

    assert!(sampler.current_snapshot().is_none());
    sampler.sample().await;

    let snapshot = sampler.current_snapshot().unwrap();
    assert_eq!(snapshot.cpu_percentage, 65.5);
    assert_eq!(snapshot.ram_used, 10_000_000_000);
    assert_eq!(snapshot.ram_total, 16_000_000_000);
    assert_eq!(snapshot.storage_used, 200_000_000_000);
    assert_eq!(snapshot.storage_total, 500_000_000_000);
    assert_eq!(snapshot.network_download_bps, 1_500);
    assert_eq!(snapshot.network_upload_bps, 250);
    assert_eq!(snapshot.ram_percentage(), 62.5);
    assert_eq!(snapshot.storage_percentage(), 40.0);
    assert!(!sampler.is_sampling());
}

#[tokio::test]
async fn test_storage_read_once_within_ttl() {
    let storage = CountingStorage::new(Some((100, 1_000)));
    let sampler = sampler(FixedCpu::new(10.0), storage.clone());

    sampler.sample().await;
    storage.set(Some((900, 1_000)));
    sampler.sample().await;

    assert_eq!(storage.reads(), 1);
    assert_eq!(sampler.current_snapshot().unwrap().storage_used, 100);
}

#[tokio::test]
async fn test_invalidate_forces_storage_read() {
    let storage = CountingStorage::new(Some((100, 1_000)));
    let sampler = sampler(FixedCpu::new(10.0), storage.clone());

    sampler.sample().await;
    storage.set(Some((900, 1_000)));
    sampler.invalidate_storage_cache();
    sampler.sample().await;

    assert_eq!(storage.reads(), 2);
    assert_eq!(sampler.current_snapshot().unwrap().storage_used, 900);
}

#[tokio::test(start_paused = true)]
async fn test_storage_reread_after_ttl() {
    let storage = CountingStorage::new(Some((100, 1_000)));
    let sampler = sampler(FixedCpu::new(10.0), storage.clone()).with_storage_ttl(Duration::from_secs(300));

    sampler.sample().await;
    storage.set(Some((300, 1_000)));

    tokio::time::advance(Duration::from_secs(299)).await;
    sampler.sample().await;
    assert_eq!(storage.reads(), 1);

    tokio::time::advance(Duration::from_secs(2)).await;
    sampler.sample().await;
    assert_eq!(storage.reads(), 2);
    assert_eq!(sampler.current_snapshot().unwrap().storage_used, 300);
}

#[tokio::test]
async fn test_cpu_failure_keeps_previous_snapshot() {
    let cpu = FixedCpu::new(42.0);
    let storage = CountingStorage::new(Some((100, 1_000)));
    let sampler = sampler(cpu.clone(), storage);

    sampler.sample().await;
    cpu.fail.store(true, Ordering::SeqCst);
    *cpu.value.lock().unwrap() = 99.0;
    sampler.sample().await;

    assert_eq!(sampler.current_snapshot().unwrap().cpu_percentage, 42.0);
    assert!(!sampler.is_sampling());
}

#[tokio::test]
async fn test_cpu_failure_before_first_sample_leaves_none() {
    let cpu = FixedCpu::new(0.0);
    cpu.fail.store(true, Ordering::SeqCst);
    let sampler = sampler(cpu, CountingStorage::new(Some((1, 2))));

    sampler.sample().await;
    assert!(sampler.current_snapshot().is_none());
}

#[tokio::test]
async fn test_storage_failure_without_cache_reports_fallback() {
    let storage = CountingStorage::new(None);
    let sampler = sampler(FixedCpu::new(5.0), storage);

    sampler.sample().await;

    let snapshot = sampler.current_snapshot().unwrap();
    assert_eq!((snapshot.storage_used, snapshot.storage_total), (0, 1));
    assert_eq!(snapshot.storage_percentage(), 0.0);
}

#[tokio::test(start_paused = true)]
async fn test_storage_failure_after_ttl_uses_stale_cache() {
    let storage = CountingStorage::new(Some((700, 1_000)));
    let sampler = sampler(FixedCpu::new(5.0), storage.clone()).with_storage_ttl(Duration::from_secs(60));

    sampler.sample().await;
    storage.set(None);
    tokio::time::advance(Duration::from_secs(61)).await;
    sampler.sample().await;

    let snapshot = sampler.current_snapshot().unwrap();
    assert_eq!(storage.reads(), 2);
    assert_eq!((snapshot.storage_used, snapshot.storage_total), (700, 1_000));
}

#[tokio::test]
async fn test_subscribers_see_new_snapshots() {
    let sampler = sampler(FixedCpu::new(12.0), CountingStorage::new(Some((1, 4))));
    let mut rx = sampler.subscribe();

    sampler.sample().await;

    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().unwrap().cpu_percentage, 12.0);
}
