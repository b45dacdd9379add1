//! Baseline-driven anomaly detection: request volume spikes and
//! drops, cost anomalies, response-time degradation, error surges, and
//! seasonal (same-hour-of-day) pattern deviations.

use std::sync::Arc;

use chrono::{DateTime, Timelike, Utc};
use lens_types::cancellation::Deadline;
use lens_types::error::Result;
use lens_types::ports::durable_store::DurableStore;
use tracing::instrument;

use crate::aggregate::HourlyAggregate;
use crate::baseline::{Baseline, BASELINE_WINDOW_HOURS};
use crate::id::anomaly_id;
use crate::kind::{AnomalyKind, Severity};
use crate::record::AnomalyRecord;

const SUDDEN_SPIKE_THRESHOLD: f64 = 3.0;
const SUDDEN_DROP_THRESHOLD: f64 = 2.5;
const COST_ANOMALY_THRESHOLD: f64 = 2.0;
const PERFORMANCE_THRESHOLD: f64 = 2.0;
const ERROR_SURGE_THRESHOLD: f64 = 1.5;
const SEASONAL_PATTERN_THRESHOLD: f64 = 2.5;
const ERROR_RATE_STDEV_FLOOR: f64 = 1.0;
/// Same-hour-of-day seasonal comparisons need at least this many prior
/// same-hour samples before they're trusted, independent of the overall
/// baseline's [`crate::baseline::MIN_BASELINE_POINTS`].
const MIN_SEASONAL_POINTS: usize = 7;

pub struct AnomalyDetector {
    durable: Arc<dyn DurableStore>,
}

impl AnomalyDetector {
    pub fn new(durable: Arc<dyn DurableStore>) -> Self {
        AnomalyDetector { durable }
    }

    /// Fetches the trailing baseline window and runs every detector
    /// against the most recent hour in it.
    #[instrument(skip(self, deadline), fields(tenant_id = %tenant_id))]
    pub async fn detect(
        &self,
        tenant_id: &str,
        now: DateTime<Utc>,
        deadline: &Deadline,
    ) -> Result<Vec<AnomalyRecord>> {
        let rows = self
            .durable
            .get_hourly_aggregates(tenant_id, BASELINE_WINDOW_HOURS + 1, deadline)
            .await?;
        let aggregates: Vec<HourlyAggregate> =
            rows.iter().filter_map(HourlyAggregate::from_value).collect();
        Ok(detect_from_aggregates(tenant_id, &aggregates, now))
    }
}

/// Pure detection over an already-fetched, oldest-first aggregate
/// window. The last element is treated as the hour under evaluation;
/// everything before it is the baseline.
pub fn detect_from_aggregates(
    tenant_id: &str,
    aggregates: &[HourlyAggregate],
    now: DateTime<Utc>,
) -> Vec<AnomalyRecord> {
    let Some((recent, history)) = aggregates.split_last() else {
        return Vec::new();
    };

    let mut anomalies = Vec::new();
    detect_request_volume(tenant_id, history, recent, now, &mut anomalies);
    detect_cost(tenant_id, history, recent, now, &mut anomalies);
    detect_performance(tenant_id, history, recent, now, &mut anomalies);
    detect_error_surge(tenant_id, history, recent, now, &mut anomalies);
    detect_seasonal_pattern(tenant_id, history, recent, now, &mut anomalies);
    anomalies
}

fn push_anomaly(
    out: &mut Vec<AnomalyRecord>,
    tenant_id: &str,
    kind: AnomalyKind,
    severity: Severity,
    metric_name: &str,
    current_value: f64,
    expected_value: f64,
    z_score: f64,
    confidence: f64,
    now: DateTime<Utc>,
) {
    out.push(AnomalyRecord {
        id: anomaly_id(tenant_id, kind, now),
        tenant_id: tenant_id.to_string(),
        kind,
        severity,
        metric_name: metric_name.to_string(),
        current_value,
        expected_value,
        z_score,
        confidence,
        detected_at: now,
    });
}

fn detect_request_volume(
    tenant_id: &str,
    history: &[HourlyAggregate],
    recent: &HourlyAggregate,
    now: DateTime<Utc>,
    out: &mut Vec<AnomalyRecord>,
) {
    let samples: Vec<f64> = history.iter().map(|a| a.requests).collect();
    let Some(baseline) = Baseline::compute(&samples) else {
        return;
    };
    if baseline.stdev == 0.0 {
        return;
    }
    let z = baseline.z_score(recent.requests, 0.0);
    if z > SUDDEN_SPIKE_THRESHOLD {
        push_anomaly(
            out,
            tenant_id,
            AnomalyKind::SuddenSpike,
            Severity::from_abs_z(z.abs()),
            "request_volume",
            recent.requests,
            baseline.mean,
            z,
            (z.abs() / 5.0).min(1.0),
            now,
        );
    } else if z < -SUDDEN_DROP_THRESHOLD {
        push_anomaly(
            out,
            tenant_id,
            AnomalyKind::SuddenDrop,
            Severity::from_abs_z(z.abs()),
            "request_volume",
            recent.requests,
            baseline.mean,
            z,
            (z.abs() / 5.0).min(1.0),
            now,
        );
    }
}

fn detect_cost(
    tenant_id: &str,
    history: &[HourlyAggregate],
    recent: &HourlyAggregate,
    now: DateTime<Utc>,
    out: &mut Vec<AnomalyRecord>,
) {
    if recent.cost == 0.0 {
        return;
    }
    let samples: Vec<f64> = history.iter().map(|a| a.cost).filter(|c| *c > 0.0).collect();
    let Some(baseline) = Baseline::compute(&samples) else {
        return;
    };
    if baseline.stdev == 0.0 {
        return;
    }
    let z = baseline.z_score(recent.cost, 0.0);
    if z.abs() > COST_ANOMALY_THRESHOLD {
        push_anomaly(
            out,
            tenant_id,
            AnomalyKind::CostAnomaly,
            Severity::from_abs_z(z.abs()),
            "cost_per_hour",
            recent.cost,
            baseline.mean,
            z,
            (z.abs() / 4.0).min(1.0),
            now,
        );
    }
}

fn detect_performance(
    tenant_id: &str,
    history: &[HourlyAggregate],
    recent: &HourlyAggregate,
    now: DateTime<Utc>,
    out: &mut Vec<AnomalyRecord>,
) {
    if recent.avg_response_ms <= 0.0 {
        return;
    }
    let samples: Vec<f64> =
        history.iter().map(|a| a.avg_response_ms).filter(|t| *t > 0.0).collect();
    let Some(baseline) = Baseline::compute(&samples) else {
        return;
    };
    if baseline.stdev == 0.0 {
        return;
    }
    let z = baseline.z_score(recent.avg_response_ms, 0.0);
    if z > PERFORMANCE_THRESHOLD {
        push_anomaly(
            out,
            tenant_id,
            AnomalyKind::PerformanceDegradation,
            Severity::from_abs_z(z.abs()),
            "response_time",
            recent.avg_response_ms,
            baseline.mean,
            z,
            (z / 4.0).min(1.0),
            now,
        );
    }
}

fn detect_error_surge(
    tenant_id: &str,
    history: &[HourlyAggregate],
    recent: &HourlyAggregate,
    now: DateTime<Utc>,
    out: &mut Vec<AnomalyRecord>,
) {
    let samples: Vec<f64> = history.iter().map(|a| a.error_rate).collect();
    let Some(baseline) = Baseline::compute(&samples) else {
        return;
    };
    let z = baseline.z_score(recent.error_rate, ERROR_RATE_STDEV_FLOOR);
    if z > ERROR_SURGE_THRESHOLD {
        push_anomaly(
            out,
            tenant_id,
            AnomalyKind::ErrorSurge,
            Severity::from_abs_z(z.abs()),
            "error_rate",
            recent.error_rate,
            baseline.mean,
            z,
            (z / 3.0).min(1.0),
            now,
        );
    }
}

/// Seasonal comparison: does this hour's request volume look typical
/// for this time of day, independent of the overall trailing baseline?
fn detect_seasonal_pattern(
    tenant_id: &str,
    history: &[HourlyAggregate],
    recent: &HourlyAggregate,
    now: DateTime<Utc>,
    out: &mut Vec<AnomalyRecord>,
) {
    if history.len() < BASELINE_WINDOW_HOURS as usize {
        return;
    }
    let same_hour: Vec<f64> = history
        .iter()
        .filter(|a| a.hour.hour() == recent.hour.hour())
        .map(|a| a.requests)
        .collect();
    if same_hour.len() < MIN_SEASONAL_POINTS {
        return;
    }
    let mean = same_hour.iter().sum::<f64>() / same_hour.len() as f64;
    let variance = same_hour.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
        / (same_hour.len() - 1).max(1) as f64;
    let stdev = variance.sqrt();
    if stdev == 0.0 {
        return;
    }
    let z = (recent.requests - mean) / stdev;
    if z.abs() > SEASONAL_PATTERN_THRESHOLD {
        push_anomaly(
            out,
            tenant_id,
            AnomalyKind::UnusualPattern,
            Severity::from_abs_z(z.abs()),
            "hourly_pattern",
            recent.requests,
            mean,
            z,
            (z.abs() / 4.0).min(1.0),
            now,
        );
    }
}
