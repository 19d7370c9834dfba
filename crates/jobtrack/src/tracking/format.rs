//! Deterministic date helpers for cards and timelines. "Now" is always passed in.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::Serialize;

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const MONTH: i64 = 30 * DAY;
const YEAR: i64 = 365 * DAY;

/// Date and time halves of a timeline entry, rendered in the display offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineStamp {
    pub date: String,
    pub time: String,
}

/// "just now", "5 minutes ago", "in 2 days", ...
pub fn format_relative(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(at).num_seconds();
    let magnitude = delta.abs();
    if magnitude < MINUTE {
        return "just now".to_string();
    }

    let (amount, unit) = match magnitude {
        m if m < HOUR => (m / MINUTE, "minute"),
        m if m < DAY => (m / HOUR, "hour"),
        m if m < MONTH => (m / DAY, "day"),
        m if m < YEAR => (m / MONTH, "month"),
        m => (m / YEAR, "year"),
    };
    let plural = if amount == 1 { "" } else { "s" };

    if delta >= 0 {
        format!("{amount} {unit}{plural} ago")
    } else {
        format!("in {amount} {unit}{plural}")
    }
}

pub fn timeline_stamp(at: DateTime<Utc>, offset: FixedOffset) -> TimelineStamp {
    let local = at.with_timezone(&offset);
    TimelineStamp {
        date: local.format("%d %b %Y").to_string(),
        time: local.format("%H:%M").to_string(),
    }
}

/// "Today at 14:05", "Yesterday at 09:30", otherwise "12 Oct 2026 at 10:00".
/// Days are compared in the display offset, not in UTC.
pub fn format_calendar(at: DateTime<Utc>, now: DateTime<Utc>, offset: FixedOffset) -> String {
    let local = at.with_timezone(&offset);
    let today = now.with_timezone(&offset).date_naive();
    let time = local.format("%H:%M");

    let day = local.date_naive();
    if day == today {
        format!("Today at {time}")
    } else if day + Duration::days(1) == today {
        format!("Yesterday at {time}")
    } else if day == today + Duration::days(1) {
        format!("Tomorrow at {time}")
    } else {
        format!("{} at {time}", local.format("%d %b %Y"))
    }
}
