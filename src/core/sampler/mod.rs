//! Samplers: combine providers under independent caching policies and
//! publish the latest snapshot on a watch channel.

mod stats;
mod weather;

pub use stats::{StatsSampler, STORAGE_CACHE_TTL};
pub use weather::{WeatherSampler, WEATHER_CACHE_TTL};
