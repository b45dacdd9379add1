//! Parsed hourly aggregate rows, as returned by
//! `DurableStore::get_hourly_aggregates`

use chrono::{DateTime, Utc};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlyAggregate {
    pub hour: DateTime<Utc>,
    pub requests: f64,
    pub cost: f64,
    pub avg_response_ms: f64,
    pub error_rate: f64,
}

impl HourlyAggregate {
    pub fn from_value(value: &Value) -> Option<Self> {
        let hour = value.get("hour")?.as_str().and_then(|s| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })?;
        Some(HourlyAggregate {
            hour,
            requests: value.get("requests")?.as_f64()?,
            cost: value.get("cost")?.as_f64()?,
            avg_response_ms: value.get("avg_response_ms")?.as_f64()?,
            error_rate: value.get("error_rate")?.as_f64()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_a_well_formed_row() {
        let v = json!({
            "hour": "2026-03-15T10:00:00Z",
            "requests": 120.0,
            "cost": 4.5,
            "avg_response_ms": 210.0,
            "error_rate": 0.5,
        });
        let agg = HourlyAggregate::from_value(&v).unwrap();
        assert_eq!(agg.requests, 120.0);
        assert_eq!(agg.error_rate, 0.5);
    }

    #[test]
    fn missing_field_yields_none() {
        let v = json!({"hour": "2026-03-15T10:00:00Z", "requests": 1.0});
        assert!(HourlyAggregate::from_value(&v).is_none());
    }
}
