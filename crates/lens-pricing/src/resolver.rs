//! Cache-through pricing-record resolution

use crate::record::PricingRecord;
use lens_cache::LayeredCache;
use lens_types::cancellation::Deadline;
use lens_types::error::Result;
use lens_types::ports::durable_store::DurableStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

const PRICING_CACHE_TTL: Duration = Duration::from_secs(86_400);

pub struct PricingResolver {
    durable: Arc<dyn DurableStore>,
    cache: Arc<LayeredCache>,
}

impl PricingResolver {
    pub fn new(durable: Arc<dyn DurableStore>, cache: Arc<LayeredCache>) -> Self {
        Self { durable, cache }
    }

    #[instrument(skip(self), fields(vendor, model))]
    pub async fn resolve(&self, vendor: &str, model: &str, deadline: &Deadline) -> Result<Option<PricingRecord>> {
        let key = lens_cache::keys::pricing(vendor, model);
        if let Some(record) = self.cache.get::<PricingRecord>(&key).await {
            return Ok(Some(record));
        }

        let Some(raw) = self.durable.get_pricing(vendor, model, deadline).await? else {
            return Ok(None);
        };
        let Some(record) = PricingRecord::from_value(&raw) else {
            return Ok(None);
        };

        self.cache.put(&key, &record, PRICING_CACHE_TTL).await?;
        Ok(Some(record))
    }

    /// Drop the cached entry, e.g. after an operator bumps a pricing
    /// record's version.
    pub async fn invalidate(&self, vendor: &str, model: &str) -> Result<()> {
        self.cache.invalidate(&lens_cache::keys::pricing(vendor, model)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use lens_kv::InMemorySubstrate;
    use lens_types::domain::PricingModel;
    use rust_decimal_macros::dec;
    use serde_json::Value;

    struct FakeDurableStore {
        record: Option<Value>,
    }

    #[async_trait]
    impl DurableStore for FakeDurableStore {
        async fn get_tenant(&self, _k: &str, _d: &Deadline) -> Result<Option<Value>> {
            Ok(None)
        }
        async fn get_pricing(&self, _v: &str, _m: &str, _d: &Deadline) -> Result<Option<Value>> {
            Ok(self.record.clone())
        }
        async fn get_rate_limit_config(&self, _t: &str, _d: &Deadline) -> Result<Option<Value>> {
            Ok(None)
        }
        async fn get_quota_config(&self, _t: &str, _d: &Deadline) -> Result<Option<Value>> {
            Ok(None)
        }
        async fn get_credential(&self, _t: &str, _v: &str, _d: &Deadline) -> Result<Option<Value>> {
            Ok(None)
        }
        async fn put_credential(&self, _t: &str, _v: &str, _r: Value, _d: &Deadline) -> Result<()> {
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
        async fn append_rotation(&self, _r: Value, _d: &Deadline) -> Result<()> {
            Ok(())
        }
        async fn get_hourly_aggregates(&self, _t: &str, _h: u32, _d: &Deadline) -> Result<Vec<Value>> {
            Ok(Vec::new())
        }
    }

    fn sample_record() -> PricingRecord {
        PricingRecord {
            vendor: "openai".to_string(),
            model: "gpt-4".to_string(),
            pricing_model: PricingModel::PerToken,
            input_price: dec!(0.00003),
            output_price: dec!(0.00006),
            currency: "USD".to_string(),
            effective_from: Utc::now(),
            version: 1,
            batch_discount: None,
            volume_tiers: None,
        }
    }

    fn resolver_with(record: Option<PricingRecord>) -> PricingResolver {
        let durable = Arc::new(FakeDurableStore { record: record.map(|r| serde_json::to_value(r).unwrap()) });
        let cache = Arc::new(LayeredCache::new(Arc::new(InMemorySubstrate::new())));
        PricingResolver::new(durable, cache)
    }

    #[tokio::test]
    async fn resolves_and_caches_a_durable_store_record() {
        let resolver = resolver_with(Some(sample_record()));
        let first = resolver.resolve("openai", "gpt-4", &Deadline::unbounded()).await.unwrap();
        assert_eq!(first, Some(sample_record()));
        assert_eq!(resolver.cache.stats().misses(), 1);

        let second = resolver.resolve("openai", "gpt-4", &Deadline::unbounded()).await.unwrap();
        assert_eq!(second, Some(sample_record()));
        assert_eq!(resolver.cache.stats().hits(), 1);
    }

    #[tokio::test]
    async fn unknown_vendor_model_resolves_to_none() {
        let resolver = resolver_with(None);
        let result = resolver.resolve("openai", "unknown-model", &Deadline::unbounded()).await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn invalidate_clears_the_cached_entry() {
        let resolver = resolver_with(Some(sample_record()));
        resolver.resolve("openai", "gpt-4", &Deadline::unbounded()).await.unwrap();
        resolver.invalidate("openai", "gpt-4").await.unwrap();
        resolver.resolve("openai", "gpt-4", &Deadline::unbounded()).await.unwrap();
        assert_eq!(resolver.cache.stats().misses(), 2);
    }
}
