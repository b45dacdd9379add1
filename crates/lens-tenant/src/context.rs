//! The resolved tenant context, and the shape of the durable tenant
//! record it is built from.

use lens_types::domain::Tier;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a resolved, authenticated request carries forward through the
/// rest of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TenantContext {
    pub tenant_id: String,
    pub tier: Tier,
    pub isolation_namespace: String,
    pub active: bool,
    pub default_limits: Value,
}

impl TenantContext {
    /// Build a context from a durable tenant record. Does not itself
    /// check `key_hash` against the caller's computed hash — the
    /// resolver does that in constant time before calling this.
    pub(crate) fn from_record(record: &Value) -> Option<Self> {
        let tenant_id = record.get("tenant_id")?.as_str()?.to_string();
        let tier: Tier = record
            .get("tier")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or(Tier::Free);
        let isolation_namespace = record
            .get("isolation_namespace")
            .and_then(Value::as_str)
            .unwrap_or(&tenant_id)
            .to_string();
        let active = record.get("active").and_then(Value::as_bool).unwrap_or(false);
        let default_limits = record.get("default_limits").cloned().unwrap_or(Value::Null);

        Some(Self {
            tenant_id,
            tier,
            isolation_namespace,
            active,
            default_limits,
        })
    }

    pub(crate) fn stored_hash<'a>(record: &'a Value) -> Option<&'a str> {
        record.get("key_hash").and_then(Value::as_str)
    }
}
