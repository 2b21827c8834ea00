//! Observable list of running apps with quit actions.

use std::sync::Arc;
use tokio::sync::watch;

use super::providers::AppLister;
use super::snapshot::AppProcess;
use crate::error::{BarstatError, Result};

pub struct AppProcessManager {
    lister: Arc<dyn AppLister>,
    apps_tx: watch::Sender<Vec<AppProcess>>,
}

impl AppProcessManager {
    pub fn new(lister: Arc<dyn AppLister>) -> Self {
        let (apps_tx, _) = watch::channel(Vec::new());
        Self { lister, apps_tx }
    }

    /// Reloads the list from the lister.
    pub async fn refresh(&self) -> Result<()> {
        let apps = self.lister.running_apps().await?;
        log::debug!("{} running apps", apps.len());
        self.apps_tx.send_replace(apps);
        Ok(())
    }

    pub fn apps(&self) -> Vec<AppProcess> {
        self.apps_tx.borrow().clone()
    }

    pub fn app_count(&self) -> usize {
        self.apps_tx.borrow().len()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<AppProcess>> {
        self.apps_tx.subscribe()
    }

    fn remove(&self, id: &str) {
        self.apps_tx.send_modify(|apps| apps.retain(|app| app.identity() != id));
    }

    /// Quits one app. Apps without a bundle identifier cannot be targeted.
    pub async fn quit(&self, app: &AppProcess) -> Result<()> {
        let bundle_identifier = app
            .bundle_identifier
            .as_deref()
            .ok_or_else(|| BarstatError::not_found(format!("{} has no bundle identifier", app.name)))?;

        self.lister.quit_app(bundle_identifier).await?;
        self.remove(app.identity());
        Ok(())
    }

    /// Quits every listed app in order, stopping at the first failure.
    ///
    /// Apps quit before the failure are removed from the list; the failing
    /// app and those after it stay. Apps without a bundle identifier are
    /// skipped and stay listed.
    pub async fn quit_all(&self) -> Result<()> {
        for app in self.apps() {
            let Some(bundle_identifier) = app.bundle_identifier.as_deref() else {
                log::info!("Skipping {}: no bundle identifier", app.name);
                continue;
            };

            self.lister.quit_app(bundle_identifier).await?;
            self.remove(app.identity());
        }

        Ok(())
    }
}
