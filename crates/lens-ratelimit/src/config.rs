//! Per-tenant rate limit configuration: a limit per window class, a
//! burst pool size, and a bypass flag.

use lens_types::domain::WindowClass;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateLimitConfig {
    pub limits: HashMap<WindowClass, u64>,
    pub burst_size: u64,
    pub bypassed: bool,
}

impl RateLimitConfig {
    pub fn limit_for(&self, class: WindowClass) -> Option<u64> {
        self.limits.get(&class).copied()
    }

    pub(crate) fn from_record(record: &Value) -> Option<Self> {
        serde_json::from_value(record.clone()).ok()
    }
}

impl Default for RateLimitConfig {
    /// A conservative default used when a tenant has no explicit
    /// configuration: the free-tier limits from the original system.
    fn default() -> Self {
        let mut limits = HashMap::new();
        limits.insert(WindowClass::Minute, 10);
        limits.insert(WindowClass::Hour, 100);
        limits.insert(WindowClass::Day, 1000);
        limits.insert(WindowClass::Month, 10_000);
        Self {
            limits,
            burst_size: 20,
            bypassed: false,
        }
    }
}
