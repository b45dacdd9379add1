//! Real-time cost counters: hourly/daily/monthly, atomic via the
//! shared substrate's `incr`, encoded as fixed-point micros so the
//! integer-only counter primitive can hold `Decimal` cost values.

use crate::period::{bucket_start, CostPeriod};
use chrono::{DateTime, Utc};
use lens_types::error::Result;
use lens_types::ports::kv::KvSubstrate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

const MICROS_PER_UNIT: i64 = 1_000_000;
/// 32 days of slack past any bucket, matching the source's fixed
/// counter retention regardless of which granularity is being written.
const COUNTER_TTL: Duration = Duration::from_secs(86_400 * 32);

fn to_micros(amount: Decimal) -> i64 {
    (amount * Decimal::from(MICROS_PER_UNIT)).round().to_i64().unwrap_or(i64::MAX)
}

fn from_micros(micros: i64) -> Decimal {
    Decimal::from(micros) / Decimal::from(MICROS_PER_UNIT)
}

pub struct CostTracker {
    kv: Arc<dyn KvSubstrate>,
}

impl CostTracker {
    pub fn new(kv: Arc<dyn KvSubstrate>) -> Self {
        Self { kv }
    }

    /// Record `cost` against every tracked granularity for `tenant_id`,
    /// atomic per bucket so two concurrent requests both land.
    #[instrument(skip(self, cost), fields(tenant_id))]
    pub async fn record(&self, tenant_id: &str, cost: Decimal, now: DateTime<Utc>) -> Result<()> {
        let micros = to_micros(cost);
        for period in [CostPeriod::Hourly, CostPeriod::Daily, CostPeriod::Monthly] {
            let key = self.key(tenant_id, period, now);
            self.kv.incr(&key, micros, COUNTER_TTL).await?;
        }
        Ok(())
    }

    pub async fn get(&self, tenant_id: &str, period: CostPeriod, now: DateTime<Utc>) -> Result<Decimal> {
        let key = self.key(tenant_id, period, now);
        match self.kv.get(&key).await? {
            Some(bytes) => {
                let micros = std::str::from_utf8(&bytes).ok().and_then(|s| s.parse::<i64>().ok()).unwrap_or(0);
                Ok(from_micros(micros))
            }
            None => Ok(Decimal::ZERO),
        }
    }

    /// Per-day costs for every day of `now`'s month that's already
    /// closed (days `1..now.day()`), oldest first. Feeds the monthly
    /// projection's variance check — today's bucket is still open and
    /// would understate itself if included.
    pub async fn daily_history(&self, tenant_id: &str, now: DateTime<Utc>) -> Result<Vec<Decimal>> {
        use chrono::{Datelike, TimeZone};
        let mut out = Vec::new();
        for day in 1..now.day() {
            let Some(at) = Utc.with_ymd_and_hms(now.year(), now.month(), day, 0, 0, 0).single() else {
                continue;
            };
            out.push(self.get(tenant_id, CostPeriod::Daily, at).await?);
        }
        Ok(out)
    }

    fn key(&self, tenant_id: &str, period: CostPeriod, now: DateTime<Utc>) -> String {
        lens_cache::keys::cost_counter(tenant_id, period.label(), bucket_start(period, now))
    }
}
