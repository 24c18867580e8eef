//! Departure time arithmetic.
//!
//! EFA reports departure times as separate hour and minute components with
//! no reliable date attached. This module turns those components into the
//! two derived fields shown on the board: minutes until departure and delay.

use chrono::{NaiveTime, Timelike};

const MILLIS_PER_MINUTE: i64 = 60_000;
const MILLIS_PER_DAY: i64 = 24 * 60 * MILLIS_PER_MINUTE;

/// A target time more than this far in the past is taken to mean tomorrow.
const ROLLOVER_THRESHOLD_MILLIS: i64 = 12 * 60 * MILLIS_PER_MINUTE;

/// Whole minutes from `now` until `hour:minute` (seconds zero).
///
/// The target is interpreted on the current date. If that lies more than
/// twelve hours in the past it is moved to the next day, so a query issued
/// at 23:50 sees a 00:10 departure as 20 minutes away. Near-future targets
/// are never moved back a day.
///
/// The millisecond difference is divided by 60 000 with truncation toward
/// zero, so a departure 4.5 minutes away reports 4 and one 30 seconds ago
/// reports 0. Out-of-range components overflow like a calendar would
/// (hour 24 is midnight tomorrow).
///
/// # Examples
///
/// ```
/// use chrono::NaiveTime;
/// use departure_board::domain::minutes_until;
///
/// let now = NaiveTime::from_hms_opt(23, 50, 0).unwrap();
/// assert_eq!(minutes_until(now, 0, 10), 20);
///
/// let now = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
/// assert_eq!(minutes_until(now, 8, 5), 5);
/// ```
pub fn minutes_until(now: NaiveTime, hour: i32, minute: i32) -> i64 {
    let now_millis = i64::from(now.num_seconds_from_midnight()) * 1000
        + i64::from(now.nanosecond() / 1_000_000);
    let target_millis = (i64::from(hour) * 60 + i64::from(minute)) * MILLIS_PER_MINUTE;

    let mut diff = target_millis - now_millis;
    if diff < -ROLLOVER_THRESHOLD_MILLIS {
        diff += MILLIS_PER_DAY;
    }

    diff / MILLIS_PER_MINUTE
}

/// Difference in minutes between the real and the scheduled time of day.
///
/// Negative when the vehicle runs early. Both times are compared on the
/// same day: a 23:58 departure running into 00:03 yields a large negative
/// value rather than 5.
///
/// # Examples
///
/// ```
/// use departure_board::domain::delay_minutes;
///
/// assert_eq!(delay_minutes(8, 0, 8, 7), 7);
/// assert_eq!(delay_minutes(8, 0, 7, 55), -5);
/// ```
pub fn delay_minutes(
    scheduled_hour: i32,
    scheduled_minute: i32,
    real_hour: i32,
    real_minute: i32,
) -> i64 {
    let scheduled = i64::from(scheduled_hour) * 60 + i64::from(scheduled_minute);
    let real = i64::from(real_hour) * 60 + i64::from(real_minute);
    real - scheduled
}

/// Render hour and minute as zero-padded "HH:MM".
pub fn format_hhmm(hour: i32, minute: i32) -> String {
    format!("{hour:02}:{minute:02}")
}
