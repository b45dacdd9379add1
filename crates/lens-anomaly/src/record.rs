//! An emitted anomaly record

use crate::kind::{AnomalyKind, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnomalyRecord {
    pub id: String,
    pub tenant_id: String,
    pub kind: AnomalyKind,
    pub severity: Severity,
    pub metric_name: String,
    pub current_value: f64,
    pub expected_value: f64,
    pub z_score: f64,
    pub confidence: f64,
    pub detected_at: DateTime<Utc>,
}
