//! Timestamp parsing and display for the command line

use chrono::{Duration, NaiveDateTime};
use thiserror::Error;

/// Accepted input layouts, tried in order
const INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%d.%m.%Y %H:%M",
];

#[derive(Debug, Error, PartialEq)]
#[error("Invalid time '{0}': expected YYYY-MM-DD HH:MM, YYYY-MM-DDTHH:MM[:SS] or DD.MM.YYYY HH:MM")]
pub struct TimeParseError(String);

/// Parses a start time given on the command line
pub fn parse_time(input: &str) -> Result<NaiveDateTime, TimeParseError> {
    let trimmed = input.trim();
    INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| TimeParseError(input.to_string()))
}

pub fn format_time(time: Option<NaiveDateTime>, format: &str) -> String {
    match time {
        Some(time) => time.format(format).to_string(),
        None => "-".to_string(),
    }
}

pub fn format_minutes(duration: Option<Duration>) -> String {
    match duration {
        Some(duration) => format!("{}m", duration.num_minutes()),
        None => "-".to_string(),
    }
}
