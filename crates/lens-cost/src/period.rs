//! Fixed hour/day/month bucket bounds for the real-time cost tracker —
//! always UTC-anchored, unlike `lens-quota`'s tenant-timezone periods,
//! since this is an internal observability bucket rather than a
//! tenant-facing billing boundary.

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostPeriod {
    Hourly,
    Daily,
    Monthly,
}

impl CostPeriod {
    pub fn label(self) -> &'static str {
        match self {
            CostPeriod::Hourly => "hourly",
            CostPeriod::Daily => "daily",
            CostPeriod::Monthly => "monthly",
        }
    }
}

/// Unix timestamp marking the start of the bucket containing `now`.
pub fn bucket_start(period: CostPeriod, now: DateTime<Utc>) -> i64 {
    match period {
        CostPeriod::Hourly => Utc
            .with_ymd_and_hms(now.year(), now.month(), now.day(), now.hour(), 0, 0)
            .unwrap()
            .timestamp(),
        CostPeriod::Daily => Utc.with_ymd_and_hms(now.year(), now.month(), now.day(), 0, 0, 0).unwrap().timestamp(),
        CostPeriod::Monthly => Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0).unwrap().timestamp(),
    }
}

pub fn days_in_month(now: DateTime<Utc>) -> u32 {
    let (next_year, next_month) = if now.month() == 12 { (now.year() + 1, 1) } else { (now.year(), now.month() + 1) };
    Utc.with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0)
        .unwrap()
        .date_naive()
        .pred_opt()
        .map(|d| d.day())
        .unwrap_or(30)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hourly_bucket_truncates_to_the_hour() {
        let now = Utc.with_ymd_and_hms(2026, 3, 15, 14, 37, 22).unwrap();
        let start = bucket_start(CostPeriod::Hourly, now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 15, 14, 0, 0).unwrap().timestamp());
    }

    #[test]
    fn monthly_bucket_truncates_to_the_first_of_month() {
        let now = Utc.with_ymd_and_hms(2026, 3, 15, 14, 37, 22).unwrap();
        let start = bucket_start(CostPeriod::Monthly, now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap().timestamp());
    }

    #[test]
    fn days_in_month_handles_february_in_a_leap_year() {
        let now = Utc.with_ymd_and_hms(2028, 2, 10, 0, 0, 0).unwrap();
        assert_eq!(days_in_month(now), 29);
    }

    #[test]
    fn days_in_month_handles_december_rollover() {
        let now = Utc.with_ymd_and_hms(2026, 12, 10, 0, 0, 0).unwrap();
        assert_eq!(days_in_month(now), 31);
    }
}
