use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One combined reading of the machine's CPU, memory, storage and network.
///
/// Values are stored as read; `used` is never checked against `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub cpu_percentage: f64,
    pub ram_used: u64,
    pub ram_total: u64,
    pub storage_used: u64,
    pub storage_total: u64,
    pub network_download_bps: u64,
    pub network_upload_bps: u64,
}

impl StatsSnapshot {
    pub fn ram_percentage(&self) -> f64 {
        percentage(self.ram_used, self.ram_total)
    }

    pub fn storage_percentage(&self) -> f64 {
        percentage(self.storage_used, self.storage_total)
    }
}

fn percentage(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (used as f64 / total as f64) * 100.0
}

/// Current temperature and condition code as reported by the forecast API.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    /// Degrees Celsius
    pub temperature: f64,
    /// WMO weather interpretation code
    pub condition_code: i32,
}

impl WeatherSnapshot {
    pub const PLACEHOLDER_CODE: i32 = -1;

    pub fn new(temperature: f64, condition_code: i32) -> Self {
        Self {
            temperature,
            condition_code,
        }
    }

    /// Shown when weather has never been fetched successfully.
    pub fn placeholder() -> Self {
        Self::new(0.0, Self::PLACEHOLDER_CODE)
    }

    pub fn is_placeholder(&self) -> bool {
        self.condition_code == Self::PLACEHOLDER_CODE && self.temperature == 0.0
    }

    pub fn icon(&self) -> WeatherIcon {
        WeatherIcon::from_code(self.condition_code)
    }
}

/// Presentation icon for a weather condition code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeatherIcon {
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Showers,
    Thunderstorm,
    Unknown,
}

impl WeatherIcon {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => WeatherIcon::Clear,
            1 | 2 => WeatherIcon::PartlyCloudy,
            3 => WeatherIcon::Cloudy,
            45 | 48 => WeatherIcon::Fog,
            51 | 53 | 55 => WeatherIcon::Drizzle,
            61 | 63 | 65 => WeatherIcon::Rain,
            71 | 73 | 75 | 77 => WeatherIcon::Snow,
            80..=82 => WeatherIcon::Showers,
            95 | 96 | 99 => WeatherIcon::Thunderstorm,
            _ => WeatherIcon::Unknown,
        }
    }

    /// Symbol name used by the menu bar renderer
    pub fn symbol_name(&self) -> &'static str {
        match self {
            WeatherIcon::Clear => "sun.max.fill",
            WeatherIcon::PartlyCloudy => "cloud.sun.fill",
            WeatherIcon::Cloudy => "cloud.fill",
            WeatherIcon::Fog => "cloud.fog.fill",
            WeatherIcon::Drizzle => "cloud.drizzle.fill",
            WeatherIcon::Rain => "cloud.rain.fill",
            WeatherIcon::Snow => "cloud.snow.fill",
            WeatherIcon::Showers => "cloud.heavyrain.fill",
            WeatherIcon::Thunderstorm => "cloud.bolt.rain.fill",
            WeatherIcon::Unknown => "questionmark.circle",
        }
    }
}

/// A running user-facing application.
///
/// `PartialEq` compares every field. List diffing should go through
/// [`AppProcess::identity`] instead, which only looks at `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppProcess {
    pub id: String,
    pub name: String,
    pub bundle_identifier: Option<String>,
    pub pid: u32,
}

impl AppProcess {
    pub fn identity(&self) -> &str {
        &self.id
    }

    pub fn same_identity(&self, other: &AppProcess) -> bool {
        self.id == other.id
    }
}

/// Keep-awake state of the power assertion controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CaffeinateState {
    #[default]
    Inactive,
    Active { until: DateTime<Utc> },
    Indefinite,
}

impl CaffeinateState {
    /// True for `Active` and `Indefinite`, without looking at the clock.
    pub fn is_active(&self) -> bool {
        match self {
            CaffeinateState::Inactive => false,
            CaffeinateState::Active { .. } | CaffeinateState::Indefinite => true,
        }
    }

    pub fn is_indefinite(&self) -> bool {
        matches!(self, CaffeinateState::Indefinite)
    }

    /// True when a timed activation has passed its deadline.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self {
            CaffeinateState::Active { until } => *until <= now,
            CaffeinateState::Inactive | CaffeinateState::Indefinite => false,
        }
    }

    /// Time left on a timed activation; `None` for the other states.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        match self {
            CaffeinateState::Active { until } => Some((*until - now).max(Duration::zero())),
            CaffeinateState::Inactive | CaffeinateState::Indefinite => None,
        }
    }
}
