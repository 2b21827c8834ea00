//! CPU load from cumulative kernel tick counters.

use async_trait::async_trait;
use std::sync::Mutex;

use super::CpuReader;
use crate::error::{BarstatError, Result};

/// Cumulative CPU ticks since boot, summed over all cores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTicks {
    pub user: u64,
    pub system: u64,
    pub idle: u64,
    pub nice: u64,
}

impl CpuTicks {
    pub fn total(&self) -> u64 {
        self.user + self.system + self.idle + self.nice
    }

    pub fn busy(&self) -> u64 {
        self.user + self.system + self.nice
    }

    /// Per-field difference; a counter that went backwards counts as 0.
    pub fn delta_since(&self, previous: &CpuTicks) -> CpuTicks {
        CpuTicks {
            user: self.user.saturating_sub(previous.user),
            system: self.system.saturating_sub(previous.system),
            idle: self.idle.saturating_sub(previous.idle),
            nice: self.nice.saturating_sub(previous.nice),
        }
    }
}

/// Busy percentage between two readings.
///
/// Without a previous reading the absolute counters are used, which gives the
/// average load since boot.
pub fn usage_between(previous: Option<&CpuTicks>, current: &CpuTicks) -> f64 {
    let delta = match previous {
        Some(prev) => current.delta_since(prev),
        None => *current,
    };

    let total = delta.total();
    if total == 0 {
        return 0.0;
    }

    (delta.busy() as f64 * 100.0 / total as f64).clamp(0.0, 100.0)
}

pub trait CpuTickSource: Send + Sync {
    fn read_ticks(&self) -> Result<CpuTicks>;
}

/// Reads ticks from the running kernel.
#[derive(Debug, Default, Clone, Copy)]
pub struct KernelTickSource;

impl CpuTickSource for KernelTickSource {
    fn read_ticks(&self) -> Result<CpuTicks> {
        read_kernel_ticks()
    }
}

#[cfg(target_os = "linux")]
fn read_kernel_ticks() -> Result<CpuTicks> {
    let stat = std::fs::read_to_string("/proc/stat")
        .map_err(|e| BarstatError::read_failed("cpu", format!("/proc/stat: {}", e)))?;
    parse_proc_stat(&stat)
}

#[cfg(target_os = "macos")]
fn read_kernel_ticks() -> Result<CpuTicks> {
    let mut info: libc::host_cpu_load_info = unsafe { std::mem::zeroed() };
    let mut count = libc::HOST_CPU_LOAD_INFO_COUNT;

    #[allow(deprecated)]
    let rc = unsafe {
        libc::host_statistics(
            libc::mach_host_self(),
            libc::HOST_CPU_LOAD_INFO,
            &mut info as *mut libc::host_cpu_load_info as libc::host_info_t,
            &mut count,
        )
    };

    if rc != libc::KERN_SUCCESS {
        return Err(BarstatError::read_failed(
            "cpu",
            format!("host_statistics returned {}", rc),
        ));
    }

    let ticks = info.cpu_ticks;
    Ok(CpuTicks {
        user: ticks[libc::CPU_STATE_USER as usize] as u64,
        system: ticks[libc::CPU_STATE_SYSTEM as usize] as u64,
        idle: ticks[libc::CPU_STATE_IDLE as usize] as u64,
        nice: ticks[libc::CPU_STATE_NICE as usize] as u64,
    })
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn read_kernel_ticks() -> Result<CpuTicks> {
    Err(BarstatError::read_failed(
        "cpu",
        "tick counters are not available on this platform",
    ))
}

/// Parses the aggregate `cpu` line of `/proc/stat`.
///
/// iowait is folded into idle; irq, softirq and steal into system.
pub fn parse_proc_stat(stat: &str) -> Result<CpuTicks> {
    let line = stat
        .lines()
        .find(|line| line.starts_with("cpu "))
        .ok_or_else(|| BarstatError::read_failed("cpu", "missing aggregate cpu line"))?;

    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map(|field| field.parse::<u64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| BarstatError::read_failed("cpu", format!("bad counter: {}", e)))?;

    if fields.len() < 4 {
        return Err(BarstatError::read_failed(
            "cpu",
            format!("expected at least 4 counters, got {}", fields.len()),
        ));
    }

    let field = |i: usize| fields.get(i).copied().unwrap_or(0);

    Ok(CpuTicks {
        user: field(0),
        nice: field(1),
        system: field(2) + field(5) + field(6) + field(7),
        idle: field(3) + field(4),
    })
}

/// CPU reader that reports load since its previous call.
pub struct TickDeltaCpuReader<S> {
    source: S,
    previous: Mutex<Option<CpuTicks>>,
}

pub type KernelCpuReader = TickDeltaCpuReader<KernelTickSource>;

impl KernelCpuReader {
    pub fn new() -> Self {
        TickDeltaCpuReader::with_source(KernelTickSource)
    }
}

impl Default for KernelCpuReader {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: CpuTickSource> TickDeltaCpuReader<S> {
    pub fn with_source(source: S) -> Self {
        Self {
            source,
            previous: Mutex::new(None),
        }
    }

    fn sample(&self) -> Result<f64> {
        let current = self.source.read_ticks()?;

        let mut previous = self
            .previous
            .lock()
            .map_err(|_| BarstatError::read_failed("cpu", "previous reading lock poisoned"))?;

        let usage = usage_between(previous.as_ref(), &current);
        *previous = Some(current);

        log::trace!("cpu ticks {:?} -> {:.1}%", current, usage);
        Ok(usage)
    }
}

#[async_trait]
impl<S: CpuTickSource> CpuReader for TickDeltaCpuReader<S> {
    async fn cpu_percentage(&self) -> Result<f64> {
        self.sample()
    }
}
