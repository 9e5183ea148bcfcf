// SPDX-License-Identifier: MIT

//! Daily pull resolution: local day keys, eligibility, retention countdown.
//!
//! All pure functions, recomputed on every request from current data.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::DailyPull;

/// Window fetched for the dashboard list.
pub const DISPLAY_WINDOW_DAYS: i64 = 7;
/// Window fetched for analytics and CSV export.
pub const ANALYTICS_WINDOW_DAYS: i64 = 60;

/// Largest legal UTC offset in minutes (UTC+14 / UTC-12 bound, rounded
/// symmetric). Anything outside falls back to UTC.
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// The viewer's local calendar day for a given instant.
///
/// `offset_minutes` is minutes east of UTC (JS callers send the negation of
/// `Date.getTimezoneOffset()`). Stable for all instants within one local
/// day; rolls over exactly at local midnight.
pub fn local_day_key(instant: DateTime<Utc>, offset_minutes: i32) -> NaiveDate {
    // Range check rather than abs(): abs() overflows on i32::MIN
    if !(-MAX_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&offset_minutes) {
        return instant.date_naive();
    }
    match FixedOffset::east_opt(offset_minutes * 60) {
        Some(offset) => instant.with_timezone(&offset).date_naive(),
        None => instant.date_naive(),
    }
}

/// Three-way classification of whether the user still needs to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullEligibility {
    /// No pull record exists at all
    FirstTime,
    /// History exists, but nothing dated today
    NewDay,
    /// A pull dated today already exists
    Satisfied,
}

/// Decide eligibility from today's key, today's record (if any), and
/// whether any history exists.
///
/// The store's unique (user, date) constraint is authoritative, but a
/// record whose date does not match `today` is treated as history rather
/// than satisfaction, so a stale or mis-queried row can never suppress the
/// day's draw.
pub fn resolve_eligibility(
    today: NaiveDate,
    todays_pull: Option<&DailyPull>,
    has_history: bool,
) -> PullEligibility {
    match todays_pull {
        Some(pull) if pull.pull_date == today => PullEligibility::Satisfied,
        Some(_) | None => {
            if has_history {
                PullEligibility::NewDay
            } else {
                PullEligibility::FirstTime
            }
        }
    }
}

/// Days until a free-tier user's oldest history starts expiring, counted
/// from signup. Returns 0 once the window has lapsed, and None if the
/// signup timestamp is unreadable.
pub fn retention_days_remaining(
    signup: &str,
    today: NaiveDate,
    retention_days: u32,
) -> Option<i64> {
    let signup_date = DateTime::parse_from_rfc3339(signup)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| signup.parse::<NaiveDate>().ok())?;

    let expires = signup_date + Duration::days(i64::from(retention_days));
    Some((expires - today).num_days().max(0))
}
