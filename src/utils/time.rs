//! Best-effort parsing of YouTube's relative timestamps

use chrono::{Duration, Utc};
use regex::Regex;

/// Parse a display string like "2 hours ago" into epoch seconds.
///
/// A trailing parenthetical (e.g. "(edited)" or an absolute-date tooltip)
/// is ignored. Returns None when the remainder is not a recognized
/// relative time; this is never an error.
pub fn parse_relative_time(text: &str) -> Option<i64> {
    let text = text
        .split('(')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();
    if text.is_empty() {
        return None;
    }
    if text == "just now" || text == "now" {
        return Some(Utc::now().timestamp());
    }

    let pattern = Regex::new(r"^(\d+|an?)\s+(second|minute|hour|day|week|month|year)s?\s+ago$")
        .expect("Invalid regex");
    let captures = pattern.captures(&text)?;

    let amount: i64 = match &captures[1] {
        "a" | "an" => 1,
        number => number.parse().ok()?,
    };
    let delta = match &captures[2] {
        "second" => Duration::seconds(amount),
        "minute" => Duration::minutes(amount),
        "hour" => Duration::hours(amount),
        "day" => Duration::days(amount),
        "week" => Duration::weeks(amount),
        // Calendar-approximate; display strings are imprecise anyway
        "month" => Duration::days(amount * 30),
        "year" => Duration::days(amount * 365),
        _ => return None,
    };

    Some((Utc::now() - delta).timestamp())
}
