//! Per-tenant quota configuration: the monthly period here is
//! calendar-aligned to the tenant's time zone and reset day, distinct
//! from the rate limiter's fixed 2629746s span.

use lens_types::domain::Tier;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaPeriod {
    Daily,
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuotaConfig {
    pub monthly_request_limit: u64,
    pub monthly_cost_limit: Decimal,
    pub daily_request_limit: Option<u64>,
    pub daily_cost_limit: Option<Decimal>,
    pub yearly_request_limit: Option<u64>,
    pub yearly_cost_limit: Option<Decimal>,
    pub warning_threshold: f64,
    pub critical_threshold: f64,
    pub danger_threshold: f64,
    pub auto_block: bool,
    pub grace_period_hours: i64,
    pub reset_day: u32,
    pub timezone: String,
}

impl QuotaConfig {
    pub fn request_limit(&self, period: QuotaPeriod) -> Option<u64> {
        match period {
            QuotaPeriod::Daily => self.daily_request_limit,
            QuotaPeriod::Monthly => Some(self.monthly_request_limit),
            QuotaPeriod::Yearly => self.yearly_request_limit,
        }
    }

    pub fn cost_limit(&self, period: QuotaPeriod) -> Option<Decimal> {
        match period {
            QuotaPeriod::Daily => self.daily_cost_limit,
            QuotaPeriod::Monthly => Some(self.monthly_cost_limit),
            QuotaPeriod::Yearly => self.yearly_cost_limit,
        }
    }

    /// Which periods this config tracks at all — monthly is always
    /// tracked, daily/yearly only when the tenant has an explicit cap.
    pub fn tracked_periods(&self) -> Vec<QuotaPeriod> {
        let mut periods = vec![QuotaPeriod::Monthly];
        if self.daily_request_limit.is_some() || self.daily_cost_limit.is_some() {
            periods.push(QuotaPeriod::Daily);
        }
        if self.yearly_request_limit.is_some() || self.yearly_cost_limit.is_some() {
            periods.push(QuotaPeriod::Yearly);
        }
        periods
    }

    pub(crate) fn from_record(record: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(record.clone()).ok()
    }

    pub fn for_tier(tier: Tier) -> Self {
        let (monthly_requests, monthly_cost, daily_requests, daily_cost) = match tier {
            Tier::Free => (1_000, dec!(10.00), Some(100), Some(dec!(1.00))),
            Tier::Basic => (10_000, dec!(100.00), Some(1_000), Some(dec!(10.00))),
            Tier::Premium => (100_000, dec!(1000.00), Some(10_000), Some(dec!(100.00))),
            Tier::Enterprise => (1_000_000, dec!(10_000.00), Some(50_000), Some(dec!(500.00))),
            Tier::Unlimited => (u64::MAX, Decimal::MAX, None, None),
        };
        Self {
            monthly_request_limit: monthly_requests,
            monthly_cost_limit: monthly_cost,
            daily_request_limit: daily_requests,
            daily_cost_limit: daily_cost,
            yearly_request_limit: None,
            yearly_cost_limit: None,
            warning_threshold: 0.75,
            critical_threshold: 0.90,
            danger_threshold: 0.95,
            auto_block: true,
            grace_period_hours: 24,
            reset_day: 1,
            timezone: "UTC".to_string(),
        }
    }
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self::for_tier(Tier::Free)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_tier_matches_documented_defaults() {
        let cfg = QuotaConfig::for_tier(Tier::Free);
        assert_eq!(cfg.monthly_request_limit, 1_000);
        assert_eq!(cfg.monthly_cost_limit, dec!(10.00));
        assert_eq!(cfg.daily_request_limit, Some(100));
    }

    #[test]
    fn monthly_is_always_tracked_daily_and_yearly_are_opt_in() {
        let free = QuotaConfig::for_tier(Tier::Free);
        assert!(free.tracked_periods().contains(&QuotaPeriod::Daily));
        assert!(!free.tracked_periods().contains(&QuotaPeriod::Yearly));
    }

    #[test]
    fn record_round_trips_through_json() {
        let cfg = QuotaConfig::for_tier(Tier::Enterprise);
        let value = serde_json::to_value(&cfg).unwrap();
        assert_eq!(QuotaConfig::from_record(&value).unwrap(), cfg);
    }
}
