//! Durable store collaborator port
//!
//! Provides key-scoped reads for tenant records, pricing records, and
//! rate-limit/quota configurations, and append writes for telemetry,
//! alert, and anomaly records plus credential rotation history. All
//! queries take a [`crate::cancellation::Deadline`].

use crate::cancellation::Deadline;
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Backend-agnostic durable store interface. The gateway never persists
/// audit trails or long-term request logs itself — it hands rows to this
/// collaborator, which an external service owns.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Fetch a tenant record by its hashed API key lookup key.
    async fn get_tenant(&self, key_hash: &str, deadline: &Deadline) -> Result<Option<Value>>;

    /// Fetch the active pricing record for (vendor, model) with the
    /// latest effective-from date at or before now.
    async fn get_pricing(
        &self,
        vendor: &str,
        model: &str,
        deadline: &Deadline,
    ) -> Result<Option<Value>>;

    /// Fetch a tenant's rate-limit configuration, if one has been set
    /// explicitly (absent means "use tier defaults").
    async fn get_rate_limit_config(
        &self,
        tenant_id: &str,
        deadline: &Deadline,
    ) -> Result<Option<Value>>;

    /// Fetch a tenant's quota configuration.
    async fn get_quota_config(&self, tenant_id: &str, deadline: &Deadline) -> Result<Option<Value>>;

    /// Fetch the current encrypted credential record for (tenant, vendor),
    /// if one has ever been stored.
    async fn get_credential(
        &self,
        tenant_id: &str,
        vendor: &str,
        deadline: &Deadline,
    ) -> Result<Option<Value>>;

    /// Persist the current encrypted credential record for (tenant,
    /// vendor), replacing whatever was there before. The caller is
    /// responsible for appending the outgoing credential to rotation
    /// history via [`DurableStore::append_rotation`] first.
    async fn put_credential(
        &self,
        tenant_id: &str,
        vendor: &str,
        record: Value,
        deadline: &Deadline,
    ) -> Result<()>;

    /// Append a structured telemetry record for a completed (or
    /// cancelled) pipeline run.
    async fn append_telemetry(&self, record: Value, deadline: &Deadline) -> Result<()>;

    /// Append an alert record.
    async fn append_alert(&self, record: Value, deadline: &Deadline) -> Result<()>;

    /// Append an anomaly record.
    async fn append_anomaly(&self, record: Value, deadline: &Deadline) -> Result<()>;

    /// Append a credential rotation-history entry.
    async fn append_rotation(&self, record: Value, deadline: &Deadline) -> Result<()>;

    /// Fetch hourly aggregates (request count, cost, avg latency, error
    /// rate) for the trailing `hours` window, used by the anomaly
    /// detector's baseline computation. Returned oldest-first.
    async fn get_hourly_aggregates(
        &self,
        tenant_id: &str,
        hours: u32,
        deadline: &Deadline,
    ) -> Result<Vec<Value>>;
}
