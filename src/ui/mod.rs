// Formatting for the headless CLI output

pub mod formatters;

pub use formatters::{
    format_caffeinate, format_percentage, format_rate, format_size, format_stats_line,
    format_temperature,
};
