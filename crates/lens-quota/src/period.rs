//! Calendar period bounds, anchored to a tenant's time zone and
//! (for monthly) configured reset day.

use crate::config::QuotaPeriod;
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// `(period_start, period_end)` as unix seconds, end exclusive.
pub fn period_bounds(period: QuotaPeriod, now: DateTime<Utc>, tz_name: &str, reset_day: u32) -> (i64, i64) {
    let tz: Tz = tz_name.parse().unwrap_or(Tz::UTC);
    let local = now.with_timezone(&tz);

    match period {
        QuotaPeriod::Daily => {
            let date = local.date_naive();
            let start = midnight_unix(&tz, date);
            let end = midnight_unix(&tz, date.succ_opt().unwrap());
            (start, end)
        }
        QuotaPeriod::Yearly => {
            let year = local.year();
            let start = midnight_unix(&tz, NaiveDate::from_ymd_opt(year, 1, 1).unwrap());
            let end = midnight_unix(&tz, NaiveDate::from_ymd_opt(year + 1, 1, 1).unwrap());
            (start, end)
        }
        QuotaPeriod::Monthly => {
            let (mut year, mut month) = (local.year(), local.month());
            let day = clamp_day(year, month, reset_day);
            if local.day() < day {
                (year, month) = prev_month(year, month);
            }
            let start_day = clamp_day(year, month, reset_day);
            let start = midnight_unix(&tz, NaiveDate::from_ymd_opt(year, month, start_day).unwrap());
            let (ny, nm) = next_month(year, month);
            let end_day = clamp_day(ny, nm, reset_day);
            let end = midnight_unix(&tz, NaiveDate::from_ymd_opt(ny, nm, end_day).unwrap());
            (start, end)
        }
    }
}

/// TTL for a counter covering a period ending at `period_end`, evaluated
/// at `now` — one extra day of slack past the period boundary
pub fn counter_ttl_secs(period_end: i64, now: i64) -> i64 {
    (period_end - now).max(0) + 86_400
}

fn midnight_unix(tz: &Tz, date: NaiveDate) -> i64 {
    tz.from_local_datetime(&date.and_hms_opt(0, 0, 0).unwrap())
        .single()
        .unwrap_or_else(|| tz.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap()))
        .timestamp()
}

fn last_day_of_month(year: i32, month: u32) -> u32 {
    let (ny, nm) = next_month(year, month);
    NaiveDate::from_ymd_opt(ny, nm, 1)
        .unwrap()
        .pred_opt()
        .unwrap()
        .day()
}

fn clamp_day(year: i32, month: u32, day: u32) -> u32 {
    day.clamp(1, last_day_of_month(year, month))
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

fn prev_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}
