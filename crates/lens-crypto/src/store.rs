//! The per-tenant credential store: encrypts vendor API
//! keys at rest, caches decrypted plaintext briefly, and keeps a
//! rotation history of every credential a tenant has superseded.

use crate::cipher;
use crate::kdf;
use chrono::Utc;
use lens_cache::LayeredCache;
use lens_types::cancellation::Deadline;
use lens_types::error::Result;
use lens_types::ports::durable_store::DurableStore;
use lens_types::secrets::SecretString;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Cache TTL for decrypted plaintext — short enough that a revoked or
/// rotated credential stops being served from cache quickly, long enough
/// to spare the durable store a round trip on every proxied request.
const PLAINTEXT_CACHE_TTL: Duration = Duration::from_secs(30);

pub struct CredentialStore {
    master_secret: Vec<u8>,
    durable: Arc<dyn DurableStore>,
    cache: Arc<LayeredCache>,
}

impl CredentialStore {
    pub fn new(
        master_secret: impl Into<Vec<u8>>,
        durable: Arc<dyn DurableStore>,
        cache: Arc<LayeredCache>,
    ) -> Self {
        Self {
            master_secret: master_secret.into(),
            durable,
            cache,
        }
    }

    fn cache_key(tenant_id: &str, vendor: &str) -> String {
        lens_cache::keys::vendor_cred(tenant_id, vendor)
    }

    fn derive_key(&self, tenant_id: &str) -> [u8; 32] {
        kdf::derive_tenant_key(&self.master_secret, tenant_id)
    }

    /// Encrypt and persist `plaintext` for (tenant, vendor). If a
    /// credential already exists for that pair it is retired to rotation
    /// history first.
    #[instrument(skip(self, plaintext), fields(tenant_id, vendor))]
    pub async fn store(
        &self,
        tenant_id: &str,
        vendor: &str,
        plaintext: &SecretString,
        deadline: &Deadline,
    ) -> Result<()> {
        self.store_with_reason(tenant_id, vendor, plaintext, "stored", deadline)
            .await
    }

    /// `store`, tagged with an explicit rotation reason in the history
    /// entry (e.g. `"scheduled_rotation"`, `"compromise_suspected"`).
    #[instrument(skip(self, new_value), fields(tenant_id, vendor, reason))]
    pub async fn rotate(
        &self,
        tenant_id: &str,
        vendor: &str,
        new_value: &SecretString,
        reason: &str,
        deadline: &Deadline,
    ) -> Result<()> {
        self.store_with_reason(tenant_id, vendor, new_value, reason, deadline)
            .await
    }

    async fn store_with_reason(
        &self,
        tenant_id: &str,
        vendor: &str,
        plaintext: &SecretString,
        reason: &str,
        deadline: &Deadline,
    ) -> Result<()> {
        if let Some(existing) = self.durable.get_credential(tenant_id, vendor, deadline).await? {
            let history_entry = json!({
                "tenant_id": tenant_id,
                "vendor": vendor,
                "envelope": existing.get("envelope").cloned().unwrap_or(Value::Null),
                "retired_at": Utc::now(),
                "reason": reason,
            });
            self.durable.append_rotation(history_entry, deadline).await?;
        }

        let key = self.derive_key(tenant_id);
        let envelope = cipher::seal(&key, plaintext.expose_secret().as_bytes());
        let record = json!({
            "tenant_id": tenant_id,
            "vendor": vendor,
            "envelope": envelope,
            "stored_at": Utc::now(),
        });
        self.durable.put_credential(tenant_id, vendor, record, deadline).await?;

        let cache_key = Self::cache_key(tenant_id, vendor);
        let _ = self.cache.invalidate(&cache_key).await;
        Ok(())
    }

    /// Fetch and decrypt the active credential for (tenant, vendor), if
    /// one exists. A cross-tenant decryption attempt (wrong derived key,
    /// or a tampered envelope) surfaces as
    /// [`lens_types::error::LensError::CryptoAuthFailed`], never a
    /// silently-wrong plaintext.
    #[instrument(skip(self), fields(tenant_id, vendor))]
    pub async fn fetch(
        &self,
        tenant_id: &str,
        vendor: &str,
        deadline: &Deadline,
    ) -> Result<Option<SecretString>> {
        let cache_key = Self::cache_key(tenant_id, vendor);
        if let Some(cached) = self.cache.get::<String>(&cache_key).await {
            return Ok(Some(SecretString::new(cached)));
        }

        let Some(record) = self.durable.get_credential(tenant_id, vendor, deadline).await? else {
            return Ok(None);
        };
        let envelope = record
            .get("envelope")
            .and_then(Value::as_str)
            .ok_or_else(|| lens_types::error::LensError::internal("credential record missing envelope"))?;

        let key = self.derive_key(tenant_id);
        let plaintext_bytes = cipher::open(&key, envelope)?;
        let plaintext = String::from_utf8(plaintext_bytes)
            .map_err(|_| lens_types::error::LensError::CryptoAuthFailed)?;

        let _ = self
            .cache
            .put(&cache_key, &plaintext, PLAINTEXT_CACHE_TTL)
            .await;

        Ok(Some(SecretString::new(plaintext)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lens_kv::InMemorySubstrate;
    use lens_types::error::LensError;
    use std::sync::Mutex;

    struct FakeDurableStore {
        credentials: Mutex<std::collections::HashMap<(String, String), Value>>,
        rotations: Mutex<Vec<Value>>,
    }

    impl FakeDurableStore {
        fn new() -> Self {
            Self {
                credentials: Mutex::new(std::collections::HashMap::new()),
                rotations: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DurableStore for FakeDurableStore {
        async fn get_tenant(&self, _key_hash: &str, _deadline: &Deadline) -> Result<Option<Value>> {
            Ok(None)
        }
        async fn get_pricing(&self, _v: &str, _m: &str, _d: &Deadline) -> Result<Option<Value>> {
            Ok(None)
        }
        async fn get_rate_limit_config(&self, _t: &str, _d: &Deadline) -> Result<Option<Value>> {
            Ok(None)
        }
        async fn get_quota_config(&self, _t: &str, _d: &Deadline) -> Result<Option<Value>> {
            Ok(None)
        }
        async fn get_credential(
            &self,
            tenant_id: &str,
            vendor: &str,
            _deadline: &Deadline,
        ) -> Result<Option<Value>> {
            Ok(self
                .credentials
                .lock()
                .unwrap()
                .get(&(tenant_id.to_string(), vendor.to_string()))
                .cloned())
        }
        async fn put_credential(
            &self,
            tenant_id: &str,
            vendor: &str,
            record: Value,
            _deadline: &Deadline,
        ) -> Result<()> {
            self.credentials
                .lock()
                .unwrap()
                .insert((tenant_id.to_string(), vendor.to_string()), record);
            Ok(())
        }
        async fn append_telemetry(&self, _r: Value, _d: &Deadline) -> Result<()> {
            Ok(())
        }
        async fn append_alert(&self, _r: Value, _d: &Deadline) -> Result<()> {
            Ok(())
        }
        async fn append_anomaly(&self, _r: Value, _d: &Deadline) -> Result<()> {
            Ok(())
        }
        async fn append_rotation(&self, record: Value, _deadline: &Deadline) -> Result<()> {
            self.rotations.lock().unwrap().push(record);
            Ok(())
        }
        async fn get_hourly_aggregates(
            &self,
            _t: &str,
            _h: u32,
            _d: &Deadline,
        ) -> Result<Vec<Value>> {
            Ok(Vec::new())
        }
    }

    fn store() -> (CredentialStore, Arc<FakeDurableStore>) {
        let durable = Arc::new(FakeDurableStore::new());
        let cache = Arc::new(LayeredCache::new(Arc::new(InMemorySubstrate::new())));
        (
            CredentialStore::new(b"unit-test-master-secret".to_vec(), durable.clone(), cache),
            durable,
        )
    }

    #[tokio::test]
    async fn store_then_fetch_round_trips_plaintext() {
        let (cs, _) = store();
        let deadline = Deadline::unbounded();
        cs.store("tenant-a", "openai", &SecretString::from("sk-abc123"), &deadline)
            .await
            .unwrap();
        let fetched = cs.fetch("tenant-a", "openai", &deadline).await.unwrap();
        assert_eq!(fetched.unwrap().expose_secret(), "sk-abc123");
    }

    #[tokio::test]
    async fn fetch_on_unknown_tenant_returns_none() {
        let (cs, _) = store();
        let deadline = Deadline::unbounded();
        let fetched = cs.fetch("tenant-x", "openai", &deadline).await.unwrap();
        assert!(fetched.is_none());
    }

    #[tokio::test]
    async fn rotate_retires_previous_credential_to_history() {
        let (cs, durable) = store();
        let deadline = Deadline::unbounded();
        cs.store("tenant-a", "openai", &SecretString::from("sk-old"), &deadline)
            .await
            .unwrap();
        cs.rotate(
            "tenant-a",
            "openai",
            &SecretString::from("sk-new"),
            "scheduled_rotation",
            &deadline,
        )
        .await
        .unwrap();

        let fetched = cs.fetch("tenant-a", "openai", &deadline).await.unwrap();
        assert_eq!(fetched.unwrap().expose_secret(), "sk-new");
        assert_eq!(durable.rotations.lock().unwrap().len(), 1);
        assert_eq!(
            durable.rotations.lock().unwrap()[0]["reason"],
            "scheduled_rotation"
        );
    }

    #[tokio::test]
    async fn cross_tenant_decryption_fails_with_auth_error() {
        let (cs, durable) = store();
        let deadline = Deadline::unbounded();
        cs.store("tenant-a", "openai", &SecretString::from("sk-abc123"), &deadline)
            .await
            .unwrap();

        // Simulate tenant B's record pointing at tenant A's envelope —
        // decrypting it under B's derived key must fail loudly.
        let stolen = durable
            .get_credential("tenant-a", "openai", &deadline)
            .await
            .unwrap()
            .unwrap();
        durable
            .put_credential("tenant-b", "openai", stolen, &deadline)
            .await
            .unwrap();

        let err = cs.fetch("tenant-b", "openai", &deadline).await.unwrap_err();
        assert!(matches!(err, LensError::CryptoAuthFailed));
    }
}
