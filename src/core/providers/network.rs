use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Instant;
use sysinfo::Networks;

use super::NetworkReader;
use crate::error::{BarstatError, Result};

/// Turns cumulative byte counters into per-second rates.
#[derive(Debug, Default)]
pub struct RateTracker {
    previous: Option<(u64, u64, Instant)>,
}

impl RateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the counters and returns `(rx, tx)` bytes/sec since the last call.
    ///
    /// The first call only sets the baseline. A counter that went backwards
    /// (interface reset, wraparound) yields 0 for that direction.
    pub fn update(&mut self, rx_total: u64, tx_total: u64, now: Instant) -> (u64, u64) {
        let rates = match self.previous {
            None => (0, 0),
            Some((prev_rx, prev_tx, prev_at)) => {
                let elapsed = now.saturating_duration_since(prev_at).as_secs_f64();
                if elapsed <= 0.0 {
                    (0, 0)
                } else {
                    let rx_diff = rx_total.saturating_sub(prev_rx);
                    let tx_diff = tx_total.saturating_sub(prev_tx);
                    (
                        (rx_diff as f64 / elapsed) as u64,
                        (tx_diff as f64 / elapsed) as u64,
                    )
                }
            }
        };

        self.previous = Some((rx_total, tx_total, now));
        rates
    }
}

pub fn interface_allowed(name: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|prefix| name.starts_with(prefix.as_str()))
}

struct NetworkState {
    networks: Networks,
    tracker: RateTracker,
}

/// Throughput over the physical and bridged interfaces, via sysinfo.
pub struct SysinfoNetworkReader {
    prefixes: Vec<String>,
    state: Mutex<NetworkState>,
}

impl SysinfoNetworkReader {
    pub fn new(prefixes: Vec<String>) -> Self {
        Self {
            prefixes,
            state: Mutex::new(NetworkState {
                networks: Networks::new_with_refreshed_list(),
                tracker: RateTracker::new(),
            }),
        }
    }

    fn read(&self) -> Result<(u64, u64)> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| BarstatError::read_failed("network", "state lock poisoned"))?;

        state.networks.refresh(true);

        let (rx, tx) = state
            .networks
            .iter()
            .filter(|(name, _)| interface_allowed(name, &self.prefixes))
            .fold((0u64, 0u64), |(rx, tx), (_, data)| {
                (
                    rx.saturating_add(data.total_received()),
                    tx.saturating_add(data.total_transmitted()),
                )
            });

        let rates = state.tracker.update(rx, tx, Instant::now());
        log::trace!("network totals rx={} tx={} -> {:?} B/s", rx, tx, rates);
        Ok(rates)
    }
}

#[async_trait]
impl NetworkReader for SysinfoNetworkReader {
    async fn network_speed(&self) -> Result<(u64, u64)> {
        self.read()
    }
}
