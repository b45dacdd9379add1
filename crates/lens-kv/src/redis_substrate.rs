//! Redis-backed implementation of [`KvSubstrate`].
//!
//! Uses a `deadpool-redis` connection pool sized by configuration;
//! acquiring a connection beyond pool capacity blocks until one is
//! available (deadpool's own wait queue) rather than failing fast — the
//! orchestrator is expected to wrap calls in its own deadline.
//!
//! Increment-then-expire is performed through a single Lua script so the
//! counter bump and its TTL refresh are atomic with respect to concurrent
//! callers, matching the "scripted transactions" requirement of the K/V
//! substrate contract.

use async_trait::async_trait;
use deadpool_redis::{Config, Pool, Runtime};
use lens_types::error::{LensError, Result};
use lens_types::ports::kv::{KvSubstrate, ScoredMember};
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, warn};

/// Lua script that increments a counter and (re)sets its TTL atomically.
/// Returns the post-increment value.
const INCR_WITH_TTL: &str = r#"
local new = redis.call('INCRBY', KEYS[1], ARGV[1])
redis.call('EXPIRE', KEYS[1], ARGV[2])
return new
"#;

pub struct RedisSubstrate {
    pool: Pool,
}

impl RedisSubstrate {
    /// Build a substrate client from a `redis://` URL and pool size.
    pub fn new(redis_url: &str, pool_size: usize) -> anyhow::Result<Self> {
        let mut cfg = Config::from_url(redis_url);
        cfg.pool = Some(deadpool_redis::PoolConfig::new(pool_size));
        let pool = cfg.create_pool(Some(Runtime::Tokio1))?;
        Ok(Self { pool })
    }

    async fn conn(&self) -> Result<deadpool_redis::Connection> {
        self.pool.get().await.map_err(|e| {
            warn!(error = %e, "failed to acquire redis connection from pool");
            LensError::substrate_transient(format!("pool exhausted or disconnected: {e}"))
        })
    }

    fn convert(err: redis::RedisError) -> LensError {
        LensError::substrate_transient(err.to_string())
    }
}

#[async_trait]
impl KvSubstrate for RedisSubstrate {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn().await?;
        let value: Option<Vec<u8>> = conn.get(key).await.map_err(Self::convert)?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: () = conn
            .set_ex(key, value, ttl.as_secs().max(1))
            .await
            .map_err(Self::convert)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: i64 = conn.del(key).await.map_err(Self::convert)?;
        Ok(())
    }

    async fn incr(&self, key: &str, delta: i64, ttl: Duration) -> Result<i64> {
        let mut conn = self.conn().await?;
        let script = redis::Script::new(INCR_WITH_TTL);
        let new_value: i64 = script
            .key(key)
            .arg(delta)
            .arg(ttl.as_secs().max(1))
            .invoke_async(&mut conn)
            .await
            .map_err(Self::convert)?;
        debug!(key, delta, new_value, "incremented counter with ttl");
        Ok(new_value)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn().await?;
        let ok: bool = conn
            .expire(key, ttl.as_secs().max(1) as i64)
            .await
            .map_err(Self::convert)?;
        Ok(ok)
    }

    async fn zadd(&self, key: &str, member: &str, score: f64, ttl: Duration) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: i64 = conn.zadd(key, member, score).await.map_err(Self::convert)?;
        let _: bool = conn
            .expire(key, ttl.as_secs().max(1) as i64)
            .await
            .map_err(Self::convert)?;
        Ok(())
    }

    async fn zrange_by_score(&self, key: &str, min: f64, max: f64) -> Result<Vec<ScoredMember>> {
        let mut conn = self.conn().await?;
        let members: Vec<(String, f64)> = conn
            .zrangebyscore_withscores(key, min, max)
            .await
            .map_err(Self::convert)?;
        Ok(members)
    }

    async fn zremrangebyscore(&self, key: &str, before: f64) -> Result<i64> {
        let mut conn = self.conn().await?;
        let removed: i64 = conn
            .zrembyscore(key, f64::NEG_INFINITY, before)
            .await
            .map_err(Self::convert)?;
        Ok(removed)
    }

    async fn zcard(&self, key: &str) -> Result<i64> {
        let mut conn = self.conn().await?;
        let count: i64 = conn.zcard(key).await.map_err(Self::convert)?;
        Ok(count)
    }

    async fn scan(&self, pattern: &str, cursor: u64, count: usize) -> Result<(u64, Vec<String>)> {
        let mut conn = self.conn().await?;
        let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(count)
            .query_async(&mut conn)
            .await
            .map_err(Self::convert)?;
        Ok((next, keys))
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(Self::convert)?;
        Ok(())
    }
}

#[cfg(all(test, feature = "redis-it"))]
mod integration_tests {
    use super::*;

    fn test_url() -> String {
        std::env::var("LENS_TEST_REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into())
    }

    #[tokio::test]
    async fn incr_applies_ttl_atomically() {
        let sub = RedisSubstrate::new(&test_url(), 4).unwrap();
        let key = "lens-kv-test:incr-atomic";
        sub.delete(key).await.unwrap();
        let v1 = sub.incr(key, 1, Duration::from_secs(30)).await.unwrap();
        let v2 = sub.incr(key, 1, Duration::from_secs(30)).await.unwrap();
        assert_eq!(v1, 1);
        assert_eq!(v2, 2);
        sub.delete(key).await.unwrap();
    }
}
