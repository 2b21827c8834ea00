use async_trait::async_trait;
use std::sync::Mutex;
use sysinfo::{MemoryRefreshKind, RefreshKind, System};

use super::RamReader;
use crate::error::{BarstatError, Result};

/// Bytes held by wired, active and compressed pages.
pub fn used_from_page_counts(wired: u64, active: u64, compressed: u64, page_size: u64) -> u64 {
    (wired + active + compressed).saturating_mul(page_size)
}

/// Memory reader backed by sysinfo, with the Mach page counters on macOS.
pub struct SystemRamReader {
    system: Mutex<System>,
}

impl SystemRamReader {
    pub fn new() -> Self {
        let refresh_kind = RefreshKind::nothing().with_memory(MemoryRefreshKind::nothing().with_ram());

        Self {
            system: Mutex::new(System::new_with_specifics(refresh_kind)),
        }
    }

    fn read(&self) -> Result<(u64, u64)> {
        let mut system = self
            .system
            .lock()
            .map_err(|_| BarstatError::read_failed("ram", "system lock poisoned"))?;

        system.refresh_memory_specifics(MemoryRefreshKind::nothing().with_ram());

        let total = system.total_memory();
        if total == 0 {
            return Err(BarstatError::read_failed("ram", "physical memory reported as 0"));
        }

        let used = used_bytes(&system)?;
        Ok((used, total))
    }
}

impl Default for SystemRamReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "macos")]
fn used_bytes(_system: &System) -> Result<u64> {
    let mut stats: libc::vm_statistics64 = unsafe { std::mem::zeroed() };
    let mut count = libc::HOST_VM_INFO64_COUNT;

    #[allow(deprecated)]
    let rc = unsafe {
        libc::host_statistics64(
            libc::mach_host_self(),
            libc::HOST_VM_INFO64,
            &mut stats as *mut libc::vm_statistics64 as libc::host_info64_t,
            &mut count,
        )
    };

    if rc != libc::KERN_SUCCESS {
        return Err(BarstatError::read_failed(
            "ram",
            format!("host_statistics64 returned {}", rc),
        ));
    }

    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if page_size <= 0 {
        return Err(BarstatError::read_failed("ram", "invalid page size"));
    }

    Ok(used_from_page_counts(
        stats.wire_count as u64,
        stats.active_count as u64,
        stats.compressor_page_count as u64,
        page_size as u64,
    ))
}

#[cfg(not(target_os = "macos"))]
fn used_bytes(system: &System) -> Result<u64> {
    Ok(system.used_memory())
}

#[async_trait]
impl RamReader for SystemRamReader {
    async fn ram_usage(&self) -> Result<(u64, u64)> {
        self.read()
    }
}
