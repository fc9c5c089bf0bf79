//! Human readable relative timestamps ("3 minutes ago").

use chrono::{DateTime, Utc};

/// Describe `then` relative to `now`, using the usual thresholds: under 45
/// seconds is "a few seconds", under 90 seconds "a minute", and so on up to
/// years.
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(then).num_seconds();
    let phrase = duration_phrase(delta.unsigned_abs());
    if delta < 0 {
        format!("in {}", phrase)
    } else {
        format!("{} ago", phrase)
    }
}

/// [`relative_time`] for an epoch-millisecond timestamp, against the clock.
pub fn relative_to_now(millis: i64) -> String {
    match DateTime::from_timestamp_millis(millis) {
        Some(then) => relative_time(then, Utc::now()),
        None => "at an unknown time".to_string(),
    }
}

fn duration_phrase(seconds: u64) -> String {
    let minutes = div_round(seconds, 60);
    let hours = div_round(seconds, 3600);
    let days = div_round(seconds, 86_400);

    if seconds < 45 {
        "a few seconds".to_string()
    } else if seconds < 90 {
        "a minute".to_string()
    } else if minutes < 45 {
        format!("{} minutes", minutes)
    } else if minutes < 90 {
        "an hour".to_string()
    } else if hours < 22 {
        format!("{} hours", hours)
    } else if hours < 36 {
        "a day".to_string()
    } else if days < 26 {
        format!("{} days", days)
    } else if days < 46 {
        "a month".to_string()
    } else if days < 320 {
        format!("{} months", ((days as f64) / 30.44).round() as u64)
    } else if days < 548 {
        "a year".to_string()
    } else {
        format!("{} years", ((days as f64) / 365.25).round() as u64)
    }
}

fn div_round(value: u64, unit: u64) -> u64 {
    (value + unit / 2) / unit
}
