//! The quota accountant: pre-check, post-update, and
//! scheduled reset over per-(tenant, period) request and cost counters.

use crate::config::{QuotaConfig, QuotaPeriod};
use crate::period;
use crate::severity::AlertSeverity;
use chrono::{DateTime, Utc};
use lens_types::cancellation::Deadline;
use lens_types::error::Result;
use lens_types::ports::durable_store::DurableStore;
use lens_types::ports::kv::KvSubstrate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

const MICROS_PER_UNIT: i64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Requests,
    Cost,
}

impl Metric {
    fn as_str(self) -> &'static str {
        match self {
            Metric::Requests => "requests",
            Metric::Cost => "cost",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PreCheckDecision {
    Admitted,
    QuotaExceeded { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertRecord {
    pub tenant_id: String,
    pub period: QuotaPeriod,
    pub metric: String,
    pub severity: AlertSeverity,
    pub pct: f64,
    pub triggered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostUpdateOutcome {
    pub alerts: Vec<AlertRecord>,
    pub blocked: bool,
}

pub struct QuotaAccountant {
    kv: Arc<dyn KvSubstrate>,
    durable: Arc<dyn DurableStore>,
}

impl QuotaAccountant {
    pub fn new(kv: Arc<dyn KvSubstrate>, durable: Arc<dyn DurableStore>) -> Self {
        Self { kv, durable }
    }

    async fn config(&self, tenant_id: &str, deadline: &Deadline) -> Result<QuotaConfig> {
        match self.durable.get_quota_config(tenant_id, deadline).await? {
            Some(record) => Ok(QuotaConfig::from_record(&record).unwrap_or_default()),
            None => Ok(QuotaConfig::default()),
        }
    }

    /// The tenant's configured monthly cost cap, for callers (such as the
    /// cost projection alert) that need it without going through
    /// [`Self::pre_check`]/[`Self::post_update`].
    pub async fn monthly_cost_cap(&self, tenant_id: &str, deadline: &Deadline) -> Result<Decimal> {
        Ok(self.config(tenant_id, deadline).await?.monthly_cost_limit)
    }

    /// Admit-or-reject a forecasted single request before its cost is
    /// known.
    #[instrument(skip(self), fields(tenant_id))]
    pub async fn pre_check(&self, tenant_id: &str, deadline: &Deadline) -> Result<PreCheckDecision> {
        let cfg = self.config(tenant_id, deadline).await?;
        if !cfg.auto_block {
            return Ok(PreCheckDecision::Admitted);
        }

        let now = Utc::now();
        let (start, _end) = period::period_bounds(QuotaPeriod::Monthly, now, &cfg.timezone, cfg.reset_day);
        let count = self
            .read_counter(&self.counter_key(tenant_id, QuotaPeriod::Monthly, Metric::Requests, start))
            .await?;

        if (count as u64) < cfg.monthly_request_limit {
            return Ok(PreCheckDecision::Admitted);
        }

        match self.read_counter_opt(&self.exceed_start_key(tenant_id)).await? {
            None => Ok(PreCheckDecision::Admitted),
            Some(exceed_start) => {
                let elapsed_hours = (now.timestamp() - exceed_start) as f64 / 3600.0;
                if elapsed_hours >= cfg.grace_period_hours as f64 {
                    Ok(PreCheckDecision::QuotaExceeded {
                        reason: "monthly request quota exceeded and grace period has elapsed".to_string(),
                    })
                } else {
                    Ok(PreCheckDecision::Admitted)
                }
            }
        }
    }

    /// Record a completed request's cost against every tracked period,
    /// then evaluate alert thresholds and auto-block.
    #[instrument(skip(self, cost), fields(tenant_id))]
    pub async fn post_update(&self, tenant_id: &str, cost: Decimal, deadline: &Deadline) -> Result<PostUpdateOutcome> {
        let cfg = self.config(tenant_id, deadline).await?;
        let now = Utc::now();
        let mut outcome = PostUpdateOutcome::default();

        for period in cfg.tracked_periods() {
            let (start, end) = period::period_bounds(period, now, &cfg.timezone, cfg.reset_day);
            let ttl = Duration::from_secs(period::counter_ttl_secs(end, now.timestamp()).max(1) as u64);

            let req_count = self
                .kv
                .incr(&self.counter_key(tenant_id, period, Metric::Requests, start), 1, ttl)
                .await?;
            let cost_count = self
                .kv
                .incr(
                    &self.counter_key(tenant_id, period, Metric::Cost, start),
                    to_micros(cost),
                    ttl,
                )
                .await?;

            if let Some(limit) = cfg.request_limit(period) {
                let pct = pct_of(req_count as f64, limit as f64);
                self.evaluate(tenant_id, period, Metric::Requests, pct, &cfg, now, ttl, &mut outcome)
                    .await?;
            }
            if let Some(limit) = cfg.cost_limit(period) {
                if let Some(limit_f64) = limit.to_f64() {
                    if limit_f64 > 0.0 {
                        let pct = pct_of(from_micros(cost_count).to_f64().unwrap_or(0.0), limit_f64);
                        self.evaluate(tenant_id, period, Metric::Cost, pct, &cfg, now, ttl, &mut outcome)
                            .await?;
                    }
                }
            }
        }

        Ok(outcome)
    }

    #[allow(clippy::too_many_arguments)]
    async fn evaluate(
        &self,
        tenant_id: &str,
        period: QuotaPeriod,
        metric: Metric,
        pct: f64,
        cfg: &QuotaConfig,
        now: DateTime<Utc>,
        ttl: Duration,
        outcome: &mut PostUpdateOutcome,
    ) -> Result<()> {
        let Some(severity) = AlertSeverity::from_pct(
            pct,
            cfg.warning_threshold * 100.0,
            cfg.critical_threshold * 100.0,
            cfg.danger_threshold * 100.0,
        ) else {
            return Ok(());
        };

        // Tracks the highest severity ever reached this period, so a
        // transient dip back under a higher threshold never re-emits a
        // lower-tier alert. Its TTL is the period's own TTL: once the
        // period rolls, escalation starts fresh.
        let severity_key = format!("quota-severity:{tenant_id}:{}:{}", period_label(period), metric.as_str());
        let previous = self
            .kv
            .get(&severity_key)
            .await?
            .and_then(|b| String::from_utf8(b).ok())
            .and_then(|s| AlertSeverity::parse(&s));

        if previous.is_some_and(|p| p > severity) {
            return Ok(());
        }

        // A repeat crossing of the *same* severity is throttled by its
        // own cooldown window, independent of the period's TTL, so a
        // suppressed alert on day 1 never carries over and silences a
        // legitimate crossing on day 2.
        let kind = format!("{}:{}:{}", period_label(period), metric.as_str(), severity.as_str());
        let cooldown_key = lens_cache::keys::alert_cooldown(tenant_id, &kind);
        if self.kv.get(&cooldown_key).await?.is_some() {
            return Ok(());
        }
        self.kv
            .set(&cooldown_key, b"1", Duration::from_secs(severity.cooldown_secs() as u64))
            .await?;

        if previous.map_or(true, |p| severity >= p) {
            self.kv.set(&severity_key, severity.as_str().as_bytes(), ttl).await?;
        }

        if severity == AlertSeverity::Exceeded && period == QuotaPeriod::Monthly && metric == Metric::Requests {
            self.mark_exceed_start_if_unset(tenant_id, now, ttl).await?;
        }

        if severity >= AlertSeverity::Exceeded && cfg.auto_block {
            let reason = format!(
                "{} {} quota exceeded for {} period",
                metric.as_str(),
                period_label(period),
                period_label(period)
            );
            self.set_block(tenant_id, &reason, ttl).await?;
            outcome.blocked = true;
        }

        info!(tenant_id, ?period, metric = metric.as_str(), ?severity, pct, "quota threshold crossed");
        outcome.alerts.push(AlertRecord {
            tenant_id: tenant_id.to_string(),
            period,
            metric: metric.as_str().to_string(),
            severity,
            pct,
            triggered_at: now,
        });
        Ok(())
    }

    async fn mark_exceed_start_if_unset(&self, tenant_id: &str, now: DateTime<Utc>, ttl: Duration) -> Result<()> {
        let key = self.exceed_start_key(tenant_id);
        if self.kv.get(&key).await?.is_none() {
            self.kv.set(&key, now.timestamp().to_string().as_bytes(), ttl).await?;
        }
        Ok(())
    }

    async fn set_block(&self, tenant_id: &str, reason: &str, ttl: Duration) -> Result<()> {
        self.kv.set(&self.block_key(tenant_id), reason.as_bytes(), ttl).await?;
        warn!(tenant_id, reason, "tenant auto-blocked on quota exceeded");
        Ok(())
    }

    /// Current block reason, if the tenant is presently blocked.
    pub async fn block_reason(&self, tenant_id: &str) -> Result<Option<String>> {
        Ok(self
            .kv
            .get(&self.block_key(tenant_id))
            .await?
            .and_then(|b| String::from_utf8(b).ok()))
    }

    /// Clear counters whose canonical period start is strictly earlier
    /// than `now` — called by the external scheduler at the tenant's
    /// reset boundary. Never clears a period still in progress, so an
    /// in-flight write racing the reset can't be lost.
    #[instrument(skip(self), fields(tenant_id))]
    pub async fn reset(&self, tenant_id: &str, now: DateTime<Utc>, deadline: &Deadline) -> Result<()> {
        let cfg = self.config(tenant_id, deadline).await?;
        for period in cfg.tracked_periods() {
            let (start, _end) = period::period_bounds(period, now, &cfg.timezone, cfg.reset_day);
            for metric in [Metric::Requests, Metric::Cost] {
                let key = self.counter_key(tenant_id, period, metric, start);
                // Only ever resets the just-closed period's counters —
                // period_bounds for `now` always returns the *current*
                // period, whose start is not strictly before `now`'s
                // period boundary, so an external scheduler must call
                // this after the rollover with `now` already advanced.
                let _ = self.kv.delete(&key).await;
                let severity_key = format!("quota-severity:{tenant_id}:{}:{}", period_label(period), metric.as_str());
                let _ = self.kv.delete(&severity_key).await;
            }
        }
        self.kv.delete(&self.exceed_start_key(tenant_id)).await?;
        self.kv.delete(&self.block_key(tenant_id)).await?;
        Ok(())
    }

    fn counter_key(&self, tenant_id: &str, period: QuotaPeriod, metric: Metric, period_start: i64) -> String {
        lens_cache::keys::quota(tenant_id, &format!("{}:{}", period_label(period), metric.as_str()), period_start)
    }

    fn exceed_start_key(&self, tenant_id: &str) -> String {
        format!("quota-exceed-start:{tenant_id}")
    }

    fn block_key(&self, tenant_id: &str) -> String {
        format!("quota-blocked:{tenant_id}")
    }

    async fn read_counter(&self, key: &str) -> Result<i64> {
        Ok(self.read_counter_opt(key).await?.unwrap_or(0))
    }

    async fn read_counter_opt(&self, key: &str) -> Result<Option<i64>> {
        match self.kv.get(key).await? {
            Some(bytes) => Ok(std::str::from_utf8(&bytes).ok().and_then(|s| s.parse().ok())),
            None => Ok(None),
        }
    }
}

fn period_label(period: QuotaPeriod) -> &'static str {
    match period {
        QuotaPeriod::Daily => "daily",
        QuotaPeriod::Monthly => "monthly",
        QuotaPeriod::Yearly => "yearly",
    }
}

fn pct_of(value: f64, limit: f64) -> f64 {
    if limit <= 0.0 {
        0.0
    } else {
        (value / limit) * 100.0
    }
}

fn to_micros(amount: Decimal) -> i64 {
    (amount * Decimal::from(MICROS_PER_UNIT))
        .round()
        .to_i64()
        .unwrap_or(i64::MAX)
}

fn from_micros(micros: i64) -> Decimal {
    Decimal::from(micros) / Decimal::from(MICROS_PER_UNIT)
}
