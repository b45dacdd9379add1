pub mod period;
pub mod projection;
pub mod tracker;

pub use period::CostPeriod;
pub use projection::{is_high, project, CostProjection};
pub use tracker::CostTracker;
