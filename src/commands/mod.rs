// Command handlers module
pub mod apps;
pub mod awake;
pub mod monitor;
pub mod stats;
pub mod weather;

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Runtime shared by the async command handlers
pub fn build_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .thread_name("barstat-worker")
        .build()
        .context("Failed to start async runtime")
}

/// Flag flipped by Ctrl+C, for the long-running commands
pub fn install_stop_flag() -> Result<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();

    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })
    .map_err(|e| anyhow::anyhow!("Failed to set Ctrl+C handler: {}", e))?;

    Ok(running)
}

// Re-exports for cleaner imports
pub use apps::{execute_list as apps, execute_quit as quit};
pub use awake::execute as awake;
pub use monitor::execute as monitor;
pub use stats::execute as stats;
pub use weather::execute as weather;
