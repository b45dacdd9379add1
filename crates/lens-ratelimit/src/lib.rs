//! # Lens Ratelimit
//!
//! Sliding-window admission control: a blended
//! current/previous sub-window count per window class, a burst pool
//! fallback, tenant bypass, and fail-open behavior on substrate errors
//! during the check itself.

pub mod config;
pub mod decision;
pub mod limiter;
pub mod sliding;

pub use config::RateLimitConfig;
pub use decision::Decision;
pub use limiter::RateLimiter;
