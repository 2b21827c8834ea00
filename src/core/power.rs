//! Keep-awake controller: the `CaffeinateState` machine over a power provider.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use super::providers::PowerAssertionProvider;
use super::snapshot::CaffeinateState;
use crate::error::{BarstatError, Result};

struct Shared {
    provider: Arc<dyn PowerAssertionProvider>,
    state_tx: watch::Sender<CaffeinateState>,
    expiry: StdMutex<Option<JoinHandle<()>>>,
    // bumped on every activation and deactivation; a timer only acts on its own
    generation: AtomicU64,
    // serializes activate / deactivate sequences
    op_lock: Mutex<()>,
}

impl Shared {
    fn set_state(&self, state: CaffeinateState) {
        log::debug!("caffeinate state -> {:?}", state);
        self.state_tx.send_replace(state);
    }

    fn take_expiry(&self) -> Option<JoinHandle<()>> {
        self.expiry.lock().ok().and_then(|mut expiry| expiry.take())
    }

    fn cancel_expiry(&self) {
        if let Some(handle) = self.take_expiry() {
            handle.abort();
        }
    }

    async fn activate(self: &Arc<Self>, duration: Option<Duration>) -> Result<()> {
        let _guard = self.op_lock.lock().await;
        self.cancel_expiry();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if let Err(e) = self.provider.deactivate().await {
            log::warn!("Failed to release previous power assertion: {}", e);
        }

        if let Err(e) = self.provider.activate(duration).await {
            self.set_state(CaffeinateState::Inactive);
            return Err(match e {
                BarstatError::ActivationFailed(_) => e,
                other => BarstatError::activation_failed(other.to_string()),
            });
        }

        match duration {
            None => self.set_state(CaffeinateState::Indefinite),
            Some(duration) => {
                let until = chrono::Duration::from_std(duration)
                    .ok()
                    .and_then(|delta| Utc::now().checked_add_signed(delta))
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);
                self.set_state(CaffeinateState::Active { until });

                let shared = Arc::clone(self);
                let handle = tokio::spawn(async move {
                    tokio::time::sleep(duration).await;
                    if let Err(e) = shared.expire(generation).await {
                        log::warn!("Failed to end expired power assertion: {}", e);
                    }
                });

                if let Ok(mut expiry) = self.expiry.lock() {
                    *expiry = Some(handle);
                }
            }
        }

        Ok(())
    }

    async fn deactivate(&self) -> Result<()> {
        let _guard = self.op_lock.lock().await;
        self.cancel_expiry();
        self.generation.fetch_add(1, Ordering::SeqCst);

        let result = self.provider.deactivate().await;
        self.set_state(CaffeinateState::Inactive);
        result
    }

    /// Ends the timed activation stamped `generation`, unless a later
    /// activation or deactivation has superseded it.
    async fn expire(&self, generation: u64) -> Result<()> {
        let _guard = self.op_lock.lock().await;

        if self.generation.load(Ordering::SeqCst) != generation {
            log::debug!("stale keep-awake timer ignored");
            return Ok(());
        }

        log::info!("keep-awake period elapsed");
        // the stored handle is this task; detach it, never abort
        drop(self.take_expiry());
        self.generation.fetch_add(1, Ordering::SeqCst);

        let result = self.provider.deactivate().await;
        self.set_state(CaffeinateState::Inactive);
        result
    }

    /// Called when the provider reports the assertion ended on its own.
    async fn resync(&self) {
        let _guard = self.op_lock.lock().await;

        if self.provider.is_active() || !self.state_tx.borrow().is_active() {
            return;
        }

        log::warn!("power assertion ended outside the controller, resetting state");
        self.cancel_expiry();
        self.set_state(CaffeinateState::Inactive);
    }
}

/// Mediates keep-awake requests and mirrors the provider's state.
pub struct PowerAssertionController {
    shared: Arc<Shared>,
    watcher: JoinHandle<()>,
}

impl PowerAssertionController {
    /// Must be called inside a Tokio runtime: spawns the provider watcher.
    pub fn new(provider: Arc<dyn PowerAssertionProvider>) -> Self {
        let (state_tx, _) = watch::channel(CaffeinateState::Inactive);
        let mut activity = provider.activity();

        let shared = Arc::new(Shared {
            provider,
            state_tx,
            expiry: StdMutex::new(None),
            generation: AtomicU64::new(0),
            op_lock: Mutex::new(()),
        });

        let watched = Arc::clone(&shared);
        let watcher = tokio::spawn(async move {
            while activity.changed().await.is_ok() {
                let active = *activity.borrow_and_update();
                if !active {
                    watched.resync().await;
                }
            }
        });

        Self { shared, watcher }
    }

    /// Keep the system awake for `duration`, then allow sleep again.
    pub async fn keep_awake(&self, duration: Duration) -> Result<()> {
        self.shared.activate(Some(duration)).await
    }

    pub async fn keep_awake_indefinitely(&self) -> Result<()> {
        self.shared.activate(None).await
    }

    /// Restart as a fresh timed activation, whatever the current state.
    pub async fn reset(&self, duration: Duration) -> Result<()> {
        self.keep_awake(duration).await
    }

    pub async fn allow_sleep(&self) -> Result<()> {
        self.shared.deactivate().await
    }

    /// Current state; a timed activation past its deadline reads as `Inactive`
    /// even if the expiry timer has not run yet.
    pub fn state(&self) -> CaffeinateState {
        let state = *self.shared.state_tx.borrow();
        if state.is_expired_at(Utc::now()) {
            CaffeinateState::Inactive
        } else {
            state
        }
    }

    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    pub fn subscribe(&self) -> watch::Receiver<CaffeinateState> {
        self.shared.state_tx.subscribe()
    }
}

impl Drop for PowerAssertionController {
    fn drop(&mut self) {
        self.watcher.abort();
        self.shared.cancel_expiry();
    }
}
