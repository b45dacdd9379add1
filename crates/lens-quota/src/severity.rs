//! Alert severities and their cooldowns Ordered so
//! `PartialOrd`/`Ord` answer "is this higher severity than the current
//! state" directly.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Warning,
    Critical,
    Danger,
    Exceeded,
    Blocked,
}

impl AlertSeverity {
    /// Cooldown before the same severity may alert again.
    pub fn cooldown_secs(self) -> i64 {
        match self {
            AlertSeverity::Warning => 3600,
            AlertSeverity::Critical => 1800,
            AlertSeverity::Danger => 900,
            AlertSeverity::Exceeded => 300,
            AlertSeverity::Blocked => 60,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AlertSeverity::Warning => "warning",
            AlertSeverity::Critical => "critical",
            AlertSeverity::Danger => "danger",
            AlertSeverity::Exceeded => "exceeded",
            AlertSeverity::Blocked => "blocked",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "warning" => Some(AlertSeverity::Warning),
            "critical" => Some(AlertSeverity::Critical),
            "danger" => Some(AlertSeverity::Danger),
            "exceeded" => Some(AlertSeverity::Exceeded),
            "blocked" => Some(AlertSeverity::Blocked),
            _ => None,
        }
    }

    /// Highest severity whose threshold `pct` (0-100) has crossed, given
    /// the tenant's configured warning/critical/danger percentages.
    /// `None` below the warning threshold.
    pub fn from_pct(pct: f64, warning_pct: f64, critical_pct: f64, danger_pct: f64) -> Option<Self> {
        if pct >= 100.0 {
            Some(AlertSeverity::Exceeded)
        } else if pct >= danger_pct {
            Some(AlertSeverity::Danger)
        } else if pct >= critical_pct {
            Some(AlertSeverity::Critical)
        } else if pct >= warning_pct {
            Some(AlertSeverity::Warning)
        } else {
            None
        }
    }
}
