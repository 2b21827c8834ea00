use async_trait::async_trait;
use std::path::{Path, PathBuf};
use sysinfo::Disks;

use super::StorageReader;
use crate::error::{BarstatError, Result};

/// Picks the mount point holding `path`: the longest one that prefixes it.
pub fn select_disk<'a, I>(mount_points: I, path: &Path) -> Option<usize>
where
    I: IntoIterator<Item = &'a Path>,
{
    mount_points
        .into_iter()
        .enumerate()
        .filter(|(_, mount)| path.starts_with(mount))
        .max_by_key(|(_, mount)| mount.components().count())
        .map(|(index, _)| index)
}

/// Used bytes of a volume from its total and user-available space.
///
/// sysinfo exposes only the space available to the user, not the raw free
/// count. On APFS that excludes purgeable space, so it is reported as used.
pub fn used_from_available(total: u64, available: u64) -> u64 {
    total.saturating_sub(available)
}

/// Usage of the volume holding a configured path. Reads fresh every call.
pub struct SysinfoStorageReader {
    mount_path: PathBuf,
}

impl SysinfoStorageReader {
    pub fn new<P: Into<PathBuf>>(mount_path: P) -> Self {
        Self {
            mount_path: mount_path.into(),
        }
    }

    fn read(&self) -> Result<(u64, u64)> {
        let disks = Disks::new_with_refreshed_list();

        let index = select_disk(
            disks.iter().map(|disk| disk.mount_point()),
            &self.mount_path,
        )
        .ok_or_else(|| {
            BarstatError::read_failed(
                "storage",
                format!("no mounted volume holds {}", self.mount_path.display()),
            )
        })?;

        let disk = &disks.list()[index];
        let total = disk.total_space();
        let available = disk.available_space();

        log::debug!(
            "storage {} on {}: total={} available={}",
            self.mount_path.display(),
            disk.mount_point().display(),
            total,
            available
        );

        Ok((used_from_available(total, available), total))
    }
}

impl Default for SysinfoStorageReader {
    fn default() -> Self {
        Self::new("/")
    }
}

#[async_trait]
impl StorageReader for SysinfoStorageReader {
    async fn storage_usage(&self) -> Result<(u64, u64)> {
        self.read()
    }
}
