use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;

static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date pattern"));

static TIME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").expect("valid time pattern"));

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    if !DATE_PATTERN.is_match(raw) {
        return Err(format!("Invalid date format (YYYY-MM-DD): {}", raw));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| format!("Invalid calendar date: {}", raw))
}

/// Parses a 24-hour `HH:MM` time of day.
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime, String> {
    if !TIME_PATTERN.is_match(raw) {
        return Err(format!("Invalid time format (HH:MM): {}", raw));
    }
    NaiveTime::parse_from_str(raw, "%H:%M").map_err(|_| format!("Invalid time of day: {}", raw))
}

pub fn validate_day_of_week(day_of_week: i32) -> Result<(), String> {
    if !(0..=6).contains(&day_of_week) {
        return Err("Day of week must be between 0 (Sunday) and 6 (Saturday)".to_string());
    }
    Ok(())
}
