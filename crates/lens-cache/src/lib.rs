//! # Lens Cache
//!
//! The layered cache: a namespaced, TTL-governed cache
//! over the shared K/V substrate for tenant records, decrypted vendor
//! credentials, and pricing tables. Tracks hit/miss/error metrics and
//! supports pattern-based invalidation.

pub mod keys;
pub mod stats;

use lens_types::error::Result;
use lens_types::ports::kv::KvSubstrate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use stats::CacheStats;
use tracing::{debug, warn};

/// The layered cache. Generic over any [`KvSubstrate`] implementation so
/// production code binds Redis and tests bind the in-memory fake.
pub struct LayeredCache {
    substrate: Arc<dyn KvSubstrate>,
    stats: CacheStats,
}

impl LayeredCache {
    pub fn new(substrate: Arc<dyn KvSubstrate>) -> Self {
        Self {
            substrate,
            stats: CacheStats::default(),
        }
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Store `value` under `key`, overwriting any previous entry.
    ///
    /// A substrate failure here is a **soft failure**: it is recorded and
    /// the caller proceeds as though caching were a no-op (fail-open on
    /// write, the cache is a hint, not a source of truth).
    pub async fn put<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let started = Instant::now();
        let bytes = serde_json::to_vec(value)?;
        match self.substrate.set(key, &bytes, ttl).await {
            Ok(()) => {
                self.stats.record_set(started.elapsed());
                Ok(())
            }
            Err(err) => {
                warn!(key, error = %err, "cache put failed, proceeding without caching");
                self.stats.record_error();
                Ok(())
            }
        }
    }

    /// Retrieve the value stored under `key`.
    ///
    /// A substrate failure here surfaces as a miss (fail-open on read) —
    /// a cache is never allowed to turn a transient substrate outage
    /// into a hard failure for its caller.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let started = Instant::now();
        match self.substrate.get(key).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<T>(&bytes) {
                Ok(value) => {
                    self.stats.record_hit(started.elapsed());
                    Some(value)
                }
                Err(err) => {
                    warn!(key, error = %err, "cache entry failed to deserialize, treating as miss");
                    self.stats.record_error();
                    None
                }
            },
            Ok(None) => {
                self.stats.record_miss(started.elapsed());
                None
            }
            Err(err) => {
                debug!(key, error = %err, "cache get failed, surfacing as miss");
                self.stats.record_error();
                self.stats.record_miss(started.elapsed());
                None
            }
        }
    }

    /// Remove a single key.
    pub async fn invalidate(&self, key: &str) -> Result<()> {
        match self.substrate.delete(key).await {
            Ok(()) => {
                self.stats.record_delete();
                Ok(())
            }
            Err(err) => {
                self.stats.record_error();
                Err(err)
            }
        }
    }

    /// Remove every key whose pattern contains `tenant_id`, across every
    /// fixed key pattern this system uses Implemented via cursor
    /// scan, deletions batched per cursor page, never a blocking
    /// full-keyspace enumeration.
    pub async fn invalidate_tenant(&self, tenant_id: &str) -> Result<usize> {
        let mut removed = 0usize;
        for pattern in keys::tenant_patterns(tenant_id) {
            let mut cursor = 0u64;
            loop {
                let (next_cursor, found) = self.substrate.scan(&pattern, cursor, 200).await?;
                for key in &found {
                    if self.substrate.delete(key).await.is_ok() {
                        removed += 1;
                        self.stats.record_delete();
                    } else {
                        self.stats.record_error();
                    }
                }
                if next_cursor == 0 {
                    break;
                }
                cursor = next_cursor;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lens_kv::InMemorySubstrate;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Widget {
        name: String,
        count: u32,
    }

    fn cache() -> LayeredCache {
        LayeredCache::new(Arc::new(InMemorySubstrate::new()))
    }

    #[tokio::test]
    async fn cache_hit_returns_most_recent_put_within_ttl() {
        let c = cache();
        let w = Widget { name: "a".into(), count: 1 };
        c.put("tenant:abc", &w, Duration::from_secs(60)).await.unwrap();
        let got: Option<Widget> = c.get("tenant:abc").await;
        assert_eq!(got, Some(w));
        assert_eq!(c.stats().hits(), 1);
    }

    #[tokio::test]
    async fn miss_on_unknown_key_is_recorded() {
        let c = cache();
        let got: Option<Widget> = c.get("tenant:missing").await;
        assert_eq!(got, None);
        assert_eq!(c.stats().misses(), 1);
    }

    #[tokio::test]
    async fn invalidate_tenant_removes_every_namespaced_key() {
        let c = cache();
        let w = Widget { name: "a".into(), count: 1 };
        c.put("tenant:t1", &w, Duration::from_secs(60)).await.unwrap();
        c.put("vendor-cred:t1:openai", &w, Duration::from_secs(60)).await.unwrap();
        c.put("pricing:openai:gpt-4", &w, Duration::from_secs(60)).await.unwrap();
        c.put("tenant:other", &w, Duration::from_secs(60)).await.unwrap();

        let removed = c.invalidate_tenant("t1").await.unwrap();
        assert_eq!(removed, 2);

        let still_there: Option<Widget> = c.get("tenant:other").await;
        assert_eq!(still_there, Some(w));
    }

    #[tokio::test]
    async fn put_put_then_get_returns_last_writer() {
        let c = cache();
        c.put("k", &Widget { name: "first".into(), count: 1 }, Duration::from_secs(60))
            .await
            .unwrap();
        c.put("k", &Widget { name: "second".into(), count: 2 }, Duration::from_secs(60))
            .await
            .unwrap();
        let got: Option<Widget> = c.get("k").await;
        assert_eq!(got.unwrap().name, "second");
    }
}
