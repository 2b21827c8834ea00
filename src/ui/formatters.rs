use chrono::{DateTime, Utc};
use humansize::{format_size as human_format_size, BINARY, DECIMAL};

use crate::core::snapshot::{CaffeinateState, StatsSnapshot, WeatherSnapshot};

/// Byte count in binary units (KiB, MiB, GiB), as memory is usually reported
pub fn format_size(size: u64) -> String {
    human_format_size(size, BINARY)
}

/// Network throughput, decimal units as network tools report them
pub fn format_rate(bytes_per_sec: u64) -> String {
    format!("{}/s", human_format_size(bytes_per_sec, DECIMAL))
}

pub fn format_percentage(value: f64) -> String {
    format!("{:.0}%", value)
}

pub fn format_temperature(weather: &WeatherSnapshot) -> String {
    if weather.is_placeholder() {
        return "--°".to_string();
    }
    format!("{:.0}°", weather.temperature)
}

/// One-line menu bar summary of a stats snapshot
pub fn format_stats_line(stats: &StatsSnapshot) -> String {
    format!(
        "CPU {}  RAM {} ({}/{})  Disk {}  ↓{} ↑{}",
        format_percentage(stats.cpu_percentage),
        format_percentage(stats.ram_percentage()),
        format_size(stats.ram_used),
        format_size(stats.ram_total),
        format_percentage(stats.storage_percentage()),
        format_rate(stats.network_download_bps),
        format_rate(stats.network_upload_bps),
    )
}

pub fn format_caffeinate(state: &CaffeinateState, now: DateTime<Utc>) -> String {
    match state {
        CaffeinateState::Inactive => "sleep allowed".to_string(),
        CaffeinateState::Indefinite => "awake (until turned off)".to_string(),
        CaffeinateState::Active { .. } => {
            let remaining = state.remaining_at(now).unwrap_or_else(chrono::Duration::zero);
            let minutes = (remaining.num_seconds() + 59) / 60;
            format!("awake ({} min left)", minutes)
        }
    }
}
