//! Running user applications, via sysinfo's process table.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use sysinfo::{Pid, Process, ProcessRefreshKind, ProcessesToUpdate, Signal, System, UpdateKind};

use super::AppLister;
use crate::core::snapshot::AppProcess;
use crate::error::{BarstatError, Result};

static BUNDLE_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<key>\s*CFBundleIdentifier\s*</key>\s*<string>\s*([^<\s]+)\s*</string>")
        .expect("bundle identifier pattern is valid")
});

/// Only bundled apps count as user-facing on macOS.
#[cfg(target_os = "macos")]
const REQUIRE_APP_BUNDLE: bool = true;
#[cfg(not(target_os = "macos"))]
const REQUIRE_APP_BUNDLE: bool = false;

/// Extracts `CFBundleIdentifier` from an XML property list.
pub fn parse_bundle_identifier(plist: &str) -> Option<String> {
    BUNDLE_ID_RE
        .captures(plist)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Root of the `.app` bundle whose main executable is `exe`.
///
/// Helpers nested deeper inside another bundle return `None`.
pub fn app_bundle_root(exe: &Path) -> Option<PathBuf> {
    let mut root = PathBuf::new();
    let mut components = exe.components();

    for component in components.by_ref() {
        root.push(component);
        if component.as_os_str().to_string_lossy().ends_with(".app") {
            break;
        }
    }

    if root.extension().and_then(|ext| ext.to_str()) != Some("app") {
        return None;
    }

    let rest: Vec<_> = components.collect();
    let is_main_executable = rest.len() == 3
        && rest[0].as_os_str() == "Contents"
        && rest[1].as_os_str() == "MacOS";

    is_main_executable.then_some(root)
}

fn read_bundle_identifier(bundle: &Path) -> Option<String> {
    let plist = fs::read(bundle.join("Contents").join("Info.plist")).ok()?;
    parse_bundle_identifier(&String::from_utf8_lossy(&plist))
}

struct AppEntry {
    app: AppProcess,
    pids: Vec<Pid>,
}

pub struct SystemAppLister {
    deny_list: Vec<String>,
    system: Mutex<System>,
}

impl SystemAppLister {
    pub fn new(deny_list: Vec<String>) -> Self {
        Self {
            deny_list,
            system: Mutex::new(System::new()),
        }
    }

    fn denied(&self, name: &str, bundle_identifier: Option<&str>) -> bool {
        self.deny_list.iter().any(|entry| {
            Some(entry.as_str()) == bundle_identifier || entry.eq_ignore_ascii_case(name)
        })
    }

    fn describe(&self, process: &Process) -> Option<(String, String, Option<String>)> {
        let exe = process.exe()?;

        match app_bundle_root(exe) {
            Some(bundle) => {
                let name = bundle.file_stem()?.to_string_lossy().to_string();
                let bundle_identifier = read_bundle_identifier(&bundle);
                let key = bundle_identifier
                    .clone()
                    .unwrap_or_else(|| bundle.to_string_lossy().to_string());
                Some((key, name, bundle_identifier))
            }
            None if !REQUIRE_APP_BUNDLE => {
                if process.thread_kind().is_some() {
                    return None;
                }
                let name = process.name().to_string_lossy().to_string();
                Some((exe.to_string_lossy().to_string(), name, None))
            }
            None => None,
        }
    }

    /// Groups the current user's processes into one entry per app.
    fn collect(&self) -> Result<Vec<AppEntry>> {
        let mut system = self
            .system
            .lock()
            .map_err(|_| BarstatError::read_failed("apps", "process table lock poisoned"))?;

        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing()
                .with_exe(UpdateKind::OnlyIfNotSet)
                .with_user(UpdateKind::OnlyIfNotSet),
        );

        let current_user = sysinfo::get_current_pid()
            .ok()
            .and_then(|pid| system.process(pid))
            .and_then(|process| process.user_id().cloned());

        let mut entries: HashMap<String, AppEntry> = HashMap::new();

        for (pid, process) in system.processes() {
            if current_user.is_some() && process.user_id() != current_user.as_ref() {
                continue;
            }

            let Some((key, name, bundle_identifier)) = self.describe(process) else {
                continue;
            };

            if self.denied(&name, bundle_identifier.as_deref()) {
                continue;
            }

            entries
                .entry(key.clone())
                .and_modify(|entry| {
                    entry.pids.push(*pid);
                    if pid.as_u32() < entry.app.pid {
                        entry.app.pid = pid.as_u32();
                    }
                })
                .or_insert_with(|| AppEntry {
                    app: AppProcess {
                        id: key,
                        name,
                        bundle_identifier,
                        pid: pid.as_u32(),
                    },
                    pids: vec![*pid],
                });
        }

        let mut entries: Vec<AppEntry> = entries.into_values().collect();
        entries.sort_by_key(|entry| entry.app.name.to_lowercase());
        Ok(entries)
    }

    fn terminate(&self, bundle_identifier: &str) -> Result<()> {
        if bundle_identifier.is_empty() {
            return Err(BarstatError::not_found("application has no bundle identifier"));
        }

        let targets: Vec<Pid> = self
            .collect()?
            .into_iter()
            .filter(|entry| entry.app.bundle_identifier.as_deref() == Some(bundle_identifier))
            .flat_map(|entry| entry.pids)
            .collect();

        if targets.is_empty() {
            return Err(BarstatError::not_found(bundle_identifier));
        }

        let system = self
            .system
            .lock()
            .map_err(|_| BarstatError::terminate_failed("process table lock poisoned"))?;

        for pid in targets {
            let Some(process) = system.process(pid) else {
                continue;
            };

            let delivered = process
                .kill_with(Signal::Term)
                .unwrap_or_else(|| process.kill());

            if !delivered {
                return Err(BarstatError::terminate_failed(format!(
                    "{} (pid {})",
                    bundle_identifier,
                    pid.as_u32()
                )));
            }
            log::info!("Sent terminate to {} (pid {})", bundle_identifier, pid.as_u32());
        }

        Ok(())
    }
}

#[async_trait]
impl AppLister for SystemAppLister {
    async fn running_apps(&self) -> Result<Vec<AppProcess>> {
        Ok(self.collect()?.into_iter().map(|entry| entry.app).collect())
    }

    async fn quit_app(&self, bundle_identifier: &str) -> Result<()> {
        self.terminate(bundle_identifier)
    }
}
