//! # Time Normalization
//!
//! The dashboard API hands out timestamps in several shapes: RFC 3339 with an
//! offset, ISO-8601 without one (`2024-03-01T09:00:00.123456`), space
//! separated (`2024-03-01 09:00:00`), and occasionally a bare time of day.
//! Everything without explicit zone information is UTC.
//!
//! None of these functions fail. Unparseable input maps to a documented
//! default (`None` or `0`) so a single bad record cannot abort an aggregate.
//!
//! ```rust
//! use statusboard_engine::time::{to_instant, is_live, format_duration};
//!
//! assert!(to_instant("2024-03-01T09:00:00").is_some());
//! assert!(to_instant("not a time").is_none());
//! assert!(is_live(Some("")));
//! assert_eq!(format_duration(3725), "1h 2m 5s");
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};

use crate::clock::Clock;

/// Placeholder rendered for missing or unparseable times
pub const MISSING_TIME: &str = "--:--:--";

const SECONDS_PER_DAY: u32 = 86_400;

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const TIME_OF_DAY_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// Parse a timestamp into a UTC instant
///
/// Returns `None` for empty or unrecognized input.
pub fn to_instant(timestamp: &str) -> Option<DateTime<Utc>> {
    let trimmed = timestamp.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(trimmed, format) {
            return Some(parsed.with_timezone(&Utc));
        }
    }

    // A trailing designator is the same as no zone at all
    let naive = trimmed
        .strip_suffix('Z')
        .or_else(|| trimmed.strip_suffix('z'))
        .unwrap_or(trimmed);

    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(naive, format) {
            return Some(parsed.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(naive, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|midnight| midnight.and_utc());
    }

    // Bare time of day, anchored on the epoch date
    for format in TIME_OF_DAY_FORMATS {
        if let Ok(time) = NaiveTime::parse_from_str(naive, format) {
            return NaiveDate::from_ymd_opt(1970, 1, 1).map(|epoch| epoch.and_time(time).and_utc());
        }
    }

    None
}

/// True when an interval has no end yet
pub fn is_live(end: Option<&str>) -> bool {
    end.is_none_or(str::is_empty)
}

/// Seconds between `start` and `end`, never negative
///
/// A live `end` is replaced by the clock's current instant. Unparseable
/// timestamps yield `0`.
pub fn elapsed_seconds(start: &str, end: Option<&str>, clock: &dyn Clock) -> u64 {
    let Some(start) = to_instant(start) else {
        return 0;
    };

    let end = match end {
        Some(end) if !end.is_empty() => match to_instant(end) {
            Some(instant) => instant,
            None => return 0,
        },
        _ => clock.now(),
    };

    elapsed_between(start, end)
}

/// Whole seconds from `start` to `end`, clamped at zero
pub fn elapsed_between(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    u64::try_from((end - start).num_seconds()).unwrap_or(0)
}

/// Seconds since local midnight for a timestamp string
///
/// Unparseable input yields `0`.
pub fn seconds_since_midnight(timestamp: &str, clock: &dyn Clock) -> u32 {
    to_instant(timestamp)
        .map(|instant| local_seconds_since_midnight(instant, clock))
        .unwrap_or(0)
}

/// Seconds since local midnight for an instant, in `[0, 86399]`
pub fn local_seconds_since_midnight(instant: DateTime<Utc>, clock: &dyn Clock) -> u32 {
    let local = instant.with_timezone(&clock.local_offset(instant));
    local.num_seconds_from_midnight() % SECONDS_PER_DAY
}

/// Render seconds as `"1h 2m 3s"`, `"2m 3s"` or `"3s"`
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let remaining = seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, remaining)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, remaining)
    } else {
        format!("{}s", remaining)
    }
}

/// Render seconds as `"1h 2m"` or `"2m"`; zero renders as `"0s"`
pub fn format_duration_short(seconds: u64) -> String {
    if seconds == 0 {
        return "0s".to_string();
    }

    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Parse `"1h 30m 15s"`-style strings back into seconds
///
/// Each unit counts once (first occurrence). Text without any recognized
/// `<digits><unit>` pair yields `0`.
pub fn parse_duration_string(text: &str) -> u64 {
    let mut hours = None;
    let mut minutes = None;
    let mut seconds = None;
    let mut digits = String::new();

    for ch in text.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }

        if !digits.is_empty() {
            let slot = match ch {
                'h' => Some(&mut hours),
                'm' => Some(&mut minutes),
                's' => Some(&mut seconds),
                _ => None,
            };
            if let Some(slot) = slot {
                if slot.is_none() {
                    *slot = digits.parse::<u64>().ok();
                }
            }
        }
        digits.clear();
    }

    hours.unwrap_or(0).saturating_mul(3600)
        .saturating_add(minutes.unwrap_or(0).saturating_mul(60))
        .saturating_add(seconds.unwrap_or(0))
}

/// Local `HH:MM:SS`, or `--:--:--` when missing or unparseable
pub fn format_time(timestamp: Option<&str>, clock: &dyn Clock) -> String {
    format_local(timestamp, clock, "%H:%M:%S")
}

/// Local `YYYY-MM-DD HH:MM:SS`, or `--:--:--` when missing or unparseable
pub fn format_date_time(timestamp: Option<&str>, clock: &dyn Clock) -> String {
    format_local(timestamp, clock, "%Y-%m-%d %H:%M:%S")
}

fn format_local(timestamp: Option<&str>, clock: &dyn Clock, pattern: &str) -> String {
    match timestamp.and_then(to_instant) {
        Some(instant) => instant
            .with_timezone(&clock.local_offset(instant))
            .format(pattern)
            .to_string(),
        None => MISSING_TIME.to_string(),
    }
}
