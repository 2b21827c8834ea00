pub mod apps;
pub mod config;
pub mod power;
pub mod providers;
pub mod runtime;
pub mod sampler;
pub mod snapshot;
pub mod state;

pub use apps::AppProcessManager;
pub use config::Config;
pub use power::PowerAssertionController;
pub use runtime::SamplingRuntime;
pub use sampler::{StatsSampler, WeatherSampler};
pub use snapshot::{AppProcess, CaffeinateState, StatsSnapshot, WeatherIcon, WeatherSnapshot};
pub use state::{MenuBarState, MenuBarView};
