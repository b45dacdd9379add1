//! Monthly cost projection

use crate::period::days_in_month;
use chrono::{DateTime, Datelike, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Below this many days of elapsed history, confidence is capped —
/// there isn't enough of the month observed yet to extrapolate safely.
const LOW_HISTORY_DAYS: u32 = 7;
/// Coefficient of variation (stdev / mean) across closed daily buckets
/// above which day-to-day spend is too erratic to trust a linear
/// extrapolation, even with a full month of history.
const HIGH_VARIANCE_CV: f64 = 0.75;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostProjection {
    pub current_month_cost: Decimal,
    pub projected_monthly_cost: Decimal,
    pub average_daily_cost: Decimal,
    pub days_elapsed: u32,
    pub days_remaining: u32,
    pub confidence_score: f64,
}

/// Project end-of-month cost as `(current / days_elapsed) * days_in_month`.
/// Confidence starts at 95, reduced to 60 when fewer than
/// [`LOW_HISTORY_DAYS`] days have elapsed (matching the source's "low
/// confidence without historical data" fallback), and reduced again when
/// `recent_daily_costs` (the month's already-closed daily buckets) shows
/// a coefficient of variation above [`HIGH_VARIANCE_CV`] — a linear
/// extrapolation is only as good as how steady the days behind it were.
pub fn project(current_month_cost: Decimal, now: DateTime<Utc>, recent_daily_costs: &[Decimal]) -> CostProjection {
    let days_elapsed = now.day();
    let total_days = days_in_month(now);
    let days_remaining = total_days.saturating_sub(days_elapsed);

    let average_daily_cost = if days_elapsed > 0 { current_month_cost / Decimal::from(days_elapsed) } else { Decimal::ZERO };
    let projected_monthly_cost = average_daily_cost * Decimal::from(total_days);

    let mut confidence_score: f64 = if days_elapsed < LOW_HISTORY_DAYS { 60.0 } else { 95.0 };
    if let Some(cv) = coefficient_of_variation(recent_daily_costs) {
        if cv > HIGH_VARIANCE_CV {
            confidence_score = confidence_score.min(50.0);
        }
    }

    CostProjection {
        current_month_cost,
        projected_monthly_cost,
        average_daily_cost,
        days_elapsed,
        days_remaining,
        confidence_score,
    }
}

/// `None` when there are fewer than two samples, or the mean is zero
/// (a free/all-zero tenant isn't "erratic", it's just quiet).
fn coefficient_of_variation(samples: &[Decimal]) -> Option<f64> {
    if samples.len() < 2 {
        return None;
    }
    let values: Vec<f64> = samples.iter().filter_map(|d| d.to_f64()).collect();
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if mean == 0.0 {
        return None;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt() / mean.abs())
}

/// A projection crossing 90% of the monthly cap warrants a
/// `projection_high` alert through the quota accountant's alert channel
pub fn is_high(projection: &CostProjection, monthly_cap: Decimal) -> bool {
    monthly_cap > Decimal::ZERO && projection.projected_monthly_cost > monthly_cap * Decimal::new(9, 1)
}
