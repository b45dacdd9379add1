//! In-memory [`KvSubstrate`] fake.
//!
//! Gives every crate in the workspace a substrate implementation with
//! real TTL and sorted-set semantics for unit tests, without requiring a
//! live Redis server — an in-memory adapter alongside the Redis one
//! rather than a mock of the trait itself.

use async_trait::async_trait;
use lens_types::error::Result;
use lens_types::ports::kv::{KvSubstrate, ScoredMember};
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

struct ZSet {
    members: BTreeMap<String, f64>,
    expires_at: Instant,
}

#[derive(Default)]
struct Store {
    strings: std::collections::HashMap<String, Entry>,
    zsets: std::collections::HashMap<String, ZSet>,
}

/// Thread-safe in-memory substrate. Expiration is checked lazily on
/// access, same externally-observable behavior as a real TTL store.
pub struct InMemorySubstrate {
    store: Mutex<Store>,
}

impl Default for InMemorySubstrate {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySubstrate {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(Store::default()),
        }
    }
}

#[async_trait]
impl KvSubstrate for InMemorySubstrate {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut store = self.store.lock().unwrap();
        if let Some(entry) = store.strings.get(key) {
            if entry.expires_at <= Instant::now() {
                store.strings.remove(key);
                return Ok(None);
            }
            return Ok(Some(entry.value.clone()));
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let mut store = self.store.lock().unwrap();
        store.strings.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut store = self.store.lock().unwrap();
        store.strings.remove(key);
        store.zsets.remove(key);
        Ok(())
    }

    async fn incr(&self, key: &str, delta: i64, ttl: Duration) -> Result<i64> {
        let mut store = self.store.lock().unwrap();
        let now = Instant::now();
        let current = store
            .strings
            .get(key)
            .filter(|e| e.expires_at > now)
            .and_then(|e| std::str::from_utf8(&e.value).ok())
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(0);
        let new_value = current + delta;
        store.strings.insert(
            key.to_string(),
            Entry {
                value: new_value.to_string().into_bytes(),
                expires_at: now + ttl,
            },
        );
        Ok(new_value)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut store = self.store.lock().unwrap();
        if let Some(entry) = store.strings.get_mut(key) {
            if entry.expires_at > Instant::now() {
                entry.expires_at = Instant::now() + ttl;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn zadd(&self, key: &str, member: &str, score: f64, ttl: Duration) -> Result<()> {
        let mut store = self.store.lock().unwrap();
        let now = Instant::now();
        let zset = store.zsets.entry(key.to_string()).or_insert_with(|| ZSet {
            members: BTreeMap::new(),
            expires_at: now + ttl,
        });
        zset.members.insert(member.to_string(), score);
        zset.expires_at = now + ttl;
        Ok(())
    }

    async fn zrange_by_score(&self, key: &str, min: f64, max: f64) -> Result<Vec<ScoredMember>> {
        let mut store = self.store.lock().unwrap();
        if let Some(zset) = store.zsets.get(key) {
            if zset.expires_at <= Instant::now() {
                store.zsets.remove(key);
                return Ok(Vec::new());
            }
            let mut out: Vec<ScoredMember> = zset
                .members
                .iter()
                .filter(|(_, &score)| score >= min && score <= max)
                .map(|(m, &s)| (m.clone(), s))
                .collect();
            out.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
            return Ok(out);
        }
        Ok(Vec::new())
    }

    async fn zremrangebyscore(&self, key: &str, before: f64) -> Result<i64> {
        let mut store = self.store.lock().unwrap();
        if let Some(zset) = store.zsets.get_mut(key) {
            let before_len = zset.members.len();
            zset.members.retain(|_, &mut score| score >= before);
            return Ok((before_len - zset.members.len()) as i64);
        }
        Ok(0)
    }

    async fn zcard(&self, key: &str) -> Result<i64> {
        let mut store = self.store.lock().unwrap();
        if let Some(zset) = store.zsets.get(key) {
            if zset.expires_at <= Instant::now() {
                store.zsets.remove(key);
                return Ok(0);
            }
            return Ok(zset.members.len() as i64);
        }
        Ok(0)
    }

    async fn scan(&self, pattern: &str, _cursor: u64, _count: usize) -> Result<(u64, Vec<String>)> {
        let store = self.store.lock().unwrap();
        let now = Instant::now();
        let matches_glob = |key: &str| -> bool {
            // Minimal glob: only `*` as a single trailing/leading/embedded wildcard,
            // sufficient for the fixed key patterns this system uses.
            if !pattern.contains('*') {
                return key == pattern;
            }
            let parts: Vec<&str> = pattern.split('*').collect();
            let mut rest = key;
            for (i, part) in parts.iter().enumerate() {
                if part.is_empty() {
                    continue;
                }
                if i == 0 {
                    if !rest.starts_with(part) {
                        return false;
                    }
                    rest = &rest[part.len()..];
                } else if let Some(pos) = rest.find(part) {
                    rest = &rest[pos + part.len()..];
                } else {
                    return false;
                }
            }
            true
        };

        let mut keys: Vec<String> = store
            .strings
            .iter()
            .filter(|(_, e)| e.expires_at > now)
            .map(|(k, _)| k.clone())
            .filter(|k| matches_glob(k))
            .collect();
        keys.extend(
            store
                .zsets
                .iter()
                .filter(|(_, z)| z.expires_at > now)
                .map(|(k, _)| k.clone())
                .filter(|k| matches_glob(k)),
        );
        Ok((0, keys))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn incr_then_incr_equals_single_increment_by_two() {
        let sub = InMemorySubstrate::new();
        sub.incr("k", 1, Duration::from_secs(60)).await.unwrap();
        let v = sub.incr("k", 1, Duration::from_secs(60)).await.unwrap();
        assert_eq!(v, 2);

        let sub2 = InMemorySubstrate::new();
        let v2 = sub2.incr("k", 2, Duration::from_secs(60)).await.unwrap();
        assert_eq!(v2, v);
    }

    #[tokio::test]
    async fn get_after_set_returns_same_value() {
        let sub = InMemorySubstrate::new();
        sub.set("k", b"hello", Duration::from_secs(60)).await.unwrap();
        assert_eq!(sub.get("k").await.unwrap(), Some(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn expired_key_reads_as_miss() {
        let sub = InMemorySubstrate::new();
        sub.set("k", b"v", Duration::from_millis(10)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(sub.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn zset_range_by_score_is_inclusive() {
        let sub = InMemorySubstrate::new();
        sub.zadd("z", "a", 1.0, Duration::from_secs(60)).await.unwrap();
        sub.zadd("z", "b", 2.0, Duration::from_secs(60)).await.unwrap();
        sub.zadd("z", "c", 3.0, Duration::from_secs(60)).await.unwrap();
        let range = sub.zrange_by_score("z", 1.0, 2.0).await.unwrap();
        assert_eq!(range.len(), 2);
    }

    #[tokio::test]
    async fn zremrangebyscore_trims_old_entries() {
        let sub = InMemorySubstrate::new();
        sub.zadd("z", "old", 1.0, Duration::from_secs(60)).await.unwrap();
        sub.zadd("z", "new", 100.0, Duration::from_secs(60)).await.unwrap();
        let removed = sub.zremrangebyscore("z", 50.0).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(sub.zcard("z").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn scan_matches_prefix_pattern() {
        let sub = InMemorySubstrate::new();
        sub.set("tenant:abc", b"1", Duration::from_secs(60)).await.unwrap();
        sub.set("tenant:def", b"1", Duration::from_secs(60)).await.unwrap();
        sub.set("other:xyz", b"1", Duration::from_secs(60)).await.unwrap();
        let (_, keys) = sub.scan("tenant:*", 0, 100).await.unwrap();
        assert_eq!(keys.len(), 2);
    }
}
