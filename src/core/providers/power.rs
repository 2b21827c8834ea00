//! Sleep prevention through an external helper process (`caffeinate`).

use async_trait::async_trait;
use std::io;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::{oneshot, watch, Mutex};

use super::PowerAssertionProvider;
use crate::core::config::Config;
use crate::error::{BarstatError, Result};

type KillReply = oneshot::Sender<io::Result<()>>;

struct Assertion {
    kill_tx: oneshot::Sender<KillReply>,
}

/// Runs one helper process per assertion; its lifetime is the assertion's.
pub struct CaffeinateProvider {
    command: String,
    base_args: Vec<String>,
    current: Mutex<Option<Assertion>>,
    generation: Arc<AtomicU64>,
    active_tx: Arc<watch::Sender<bool>>,
}

impl CaffeinateProvider {
    pub fn new<S: Into<String>>(command: S, base_args: Vec<String>) -> Self {
        let (active_tx, _) = watch::channel(false);

        Self {
            command: command.into(),
            base_args,
            current: Mutex::new(None),
            generation: Arc::new(AtomicU64::new(0)),
            active_tx: Arc::new(active_tx),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.caffeinate_command.clone(), config.caffeinate_args.clone())
    }

    fn build_command(&self, duration: Option<Duration>) -> Command {
        let mut command = Command::new(&self.command);
        command
            .args(&self.base_args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        if let Some(duration) = duration {
            command.arg("-t").arg(duration.as_secs().max(1).to_string());
        }

        command
    }

    async fn stop(&self, slot: &mut Option<Assertion>) -> Result<()> {
        let Some(assertion) = slot.take() else {
            self.active_tx.send_replace(false);
            return Ok(());
        };

        // Detach the watcher so its exit does not report on a newer assertion
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.active_tx.send_replace(false);

        let (reply_tx, reply_rx) = oneshot::channel();
        if assertion.kill_tx.send(reply_tx).is_err() {
            // helper already exited on its own
            return Ok(());
        }

        match reply_rx.await {
            Ok(Err(e)) => Err(BarstatError::deactivation_failed(e.to_string())),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl PowerAssertionProvider for CaffeinateProvider {
    async fn activate(&self, duration: Option<Duration>) -> Result<()> {
        let mut current = self.current.lock().await;
        self.stop(&mut current).await?;

        let mut child = self.build_command(duration).spawn().map_err(|e| {
            BarstatError::activation_failed(format!("{}: {}", self.command, e))
        })?;

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (kill_tx, kill_rx) = oneshot::channel::<KillReply>();
        self.active_tx.send_replace(true);

        let watched_generation = Arc::clone(&self.generation);
        let active_tx = Arc::clone(&self.active_tx);
        let pid = child.id();

        tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => {
                    log::info!("power assertion helper {:?} exited: {:?}", pid, status);
                }
                reply = kill_rx => {
                    let result = child.kill().await;
                    if let Ok(reply) = reply {
                        let _ = reply.send(result);
                    }
                    return;
                }
            }

            if watched_generation.load(Ordering::SeqCst) == generation {
                active_tx.send_replace(false);
            }
        });

        log::info!(
            "power assertion started (pid {:?}, duration {:?})",
            pid,
            duration
        );
        *current = Some(Assertion { kill_tx });
        Ok(())
    }

    async fn deactivate(&self) -> Result<()> {
        let mut current = self.current.lock().await;
        self.stop(&mut current).await
    }

    fn is_active(&self) -> bool {
        *self.active_tx.borrow()
    }

    fn activity(&self) -> watch::Receiver<bool> {
        self.active_tx.subscribe()
    }
}
