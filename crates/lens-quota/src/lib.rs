pub mod accountant;
pub mod config;
pub mod period;
pub mod severity;

pub use accountant::{AlertRecord, Metric, PostUpdateOutcome, PreCheckDecision, QuotaAccountant};
pub use config::{QuotaConfig, QuotaPeriod};
pub use severity::AlertSeverity;
