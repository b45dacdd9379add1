pub mod aggregate;
pub mod baseline;
pub mod detector;
pub mod id;
pub mod kind;
pub mod record;

pub use aggregate::HourlyAggregate;
pub use baseline::{Baseline, BASELINE_WINDOW_HOURS, MIN_BASELINE_POINTS};
pub use detector::{detect_from_aggregates, AnomalyDetector};
pub use id::anomaly_id;
pub use kind::{AnomalyKind, Severity};
pub use record::AnomalyRecord;
