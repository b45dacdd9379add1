//! Anomaly kinds and their severity ladder

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    SuddenSpike,
    SuddenDrop,
    CostAnomaly,
    PerformanceDegradation,
    ErrorSurge,
    UnusualPattern,
}

impl AnomalyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AnomalyKind::SuddenSpike => "sudden_spike",
            AnomalyKind::SuddenDrop => "sudden_drop",
            AnomalyKind::CostAnomaly => "cost_anomaly",
            AnomalyKind::PerformanceDegradation => "performance_degradation",
            AnomalyKind::ErrorSurge => "error_surge",
            AnomalyKind::UnusualPattern => "unusual_pattern",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
    Emergency,
}

impl Severity {
    /// `|z| ≥ 4` emergency, `≥ 3` critical, `≥ 2` warning, else info.
    pub fn from_abs_z(abs_z: f64) -> Self {
        if abs_z >= 4.0 {
            Severity::Emergency
        } else if abs_z >= 3.0 {
            Severity::Critical
        } else if abs_z >= 2.0 {
            Severity::Warning
        } else {
            Severity::Info
        }
    }

    pub fn notifies_externally(self) -> bool {
        matches!(self, Severity::Critical | Severity::Emergency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_thresholds_match_documented_bands() {
        assert_eq!(Severity::from_abs_z(1.0), Severity::Info);
        assert_eq!(Severity::from_abs_z(2.0), Severity::Warning);
        assert_eq!(Severity::from_abs_z(3.0), Severity::Critical);
        assert_eq!(Severity::from_abs_z(4.0), Severity::Emergency);
    }

    #[test]
    fn only_critical_and_emergency_notify_externally() {
        assert!(!Severity::Info.notifies_externally());
        assert!(!Severity::Warning.notifies_externally());
        assert!(Severity::Critical.notifies_externally());
        assert!(Severity::Emergency.notifies_externally());
    }
}
