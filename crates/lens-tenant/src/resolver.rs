//! Bearer-secret to [`TenantContext`] resolution
//!
//! `tenant:<hash>` is cached for an hour on success; an inactive tenant
//! or an unrecognized secret is always an authentication failure,
//! whether served from cache or freshly fetched.

use crate::context::TenantContext;
use crate::hash;
use lens_cache::LayeredCache;
use lens_types::cancellation::Deadline;
use lens_types::error::{LensError, Result};
use lens_types::ports::durable_store::DurableStore;
use lens_types::secrets::SecretString;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

const TENANT_CACHE_TTL: Duration = Duration::from_secs(3600);

pub struct TenantResolver {
    durable: Arc<dyn DurableStore>,
    cache: Arc<LayeredCache>,
    pepper: Vec<u8>,
}

impl TenantResolver {
    pub fn new(durable: Arc<dyn DurableStore>, cache: Arc<LayeredCache>, pepper: impl Into<Vec<u8>>) -> Self {
        Self {
            durable,
            cache,
            pepper: pepper.into(),
        }
    }

    #[instrument(skip(self, bearer_secret))]
    pub async fn resolve(&self, bearer_secret: &SecretString, deadline: &Deadline) -> Result<TenantContext> {
        let key_hash = hash::hash_secret(bearer_secret.expose_secret(), &self.pepper);
        let cache_key = lens_cache::keys::tenant(&key_hash);

        if let Some(ctx) = self.cache.get::<TenantContext>(&cache_key).await {
            return Self::require_active(ctx);
        }

        let record = self
            .durable
            .get_tenant(&key_hash, deadline)
            .await?
            .ok_or(LensError::Unauthenticated)?;

        let stored_hash = TenantContext::stored_hash(&record).ok_or(LensError::Unauthenticated)?;
        if !hash::constant_time_eq(&key_hash, stored_hash) {
            return Err(LensError::Unauthenticated);
        }

        let ctx = TenantContext::from_record(&record).ok_or(LensError::Unauthenticated)?;
        let _ = self.cache.put(&cache_key, &ctx, TENANT_CACHE_TTL).await;

        Self::require_active(ctx)
    }

    fn require_active(ctx: TenantContext) -> Result<TenantContext> {
        if ctx.active {
            Ok(ctx)
        } else {
            Err(LensError::Unauthenticated)
        }
    }
}
