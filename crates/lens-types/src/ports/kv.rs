//! Shared K/V substrate port.
//!
//! Every write carries an explicit TTL (or is derived from a sorted-set
//! trim policy) — no unbounded keys. Scans use cursor iteration, never
//! blocking enumeration. On connection loss, operations fail with
//! [`crate::error::LensError::SubstrateTransient`]; callers decide
//! fail-open vs fail-closed per the collaborator's own error policy.
//!
//! # Example
//!
//! ```rust,ignore
//! use lens_types::ports::KvSubstrate;
//! use std::time::Duration;
//!
//! async fn bump(kv: &dyn KvSubstrate, key: &str) -> lens_types::Result<i64> {
//!     kv.incr(key, 1, Duration::from_secs(120)).await
//! }
//! ```

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// A single member of a sorted-set range query: (member, score).
pub type ScoredMember = (String, f64);

/// Backend-agnostic K/V substrate interface.
///
/// Implementations must be thread-safe (`Send + Sync`). All byte slices are
/// opaque binary data; string values are UTF-8 encoded by convention.
#[async_trait]
pub trait KvSubstrate: Send + Sync {
    /// Retrieve a value by key. `Ok(None)` on miss.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store a value, overwriting any previous value, with an explicit TTL.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;

    /// Delete a key. `Ok(())` whether or not it existed.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Atomically increment an integer counter stored at `key` by `delta`,
    /// creating it at zero first if absent, and (re)apply `ttl` on every
    /// call so hot keys never go unbounded.
    async fn incr(&self, key: &str, delta: i64, ttl: Duration) -> Result<i64>;

    /// Set or refresh a key's expiration without touching its value.
    /// Returns `false` if the key does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// Batch get. Backends should pipeline this rather than looping `get`.
    async fn mget(&self, keys: &[&str]) -> Result<Vec<Option<Vec<u8>>>> {
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            out.push(self.get(key).await?);
        }
        Ok(out)
    }

    /// Add a member with a score to a sorted set, applying `ttl` to the
    /// whole set (used for burst/window trim policies).
    async fn zadd(&self, key: &str, member: &str, score: f64, ttl: Duration) -> Result<()>;

    /// Range a sorted set by score, inclusive on both ends.
    async fn zrange_by_score(
        &self,
        key: &str,
        min: f64,
        max: f64,
    ) -> Result<Vec<ScoredMember>>;

    /// Remove members of a sorted set with score strictly less than
    /// `before`. Used to trim sliding windows without unbounded growth.
    async fn zremrangebyscore(&self, key: &str, before: f64) -> Result<i64>;

    /// Cardinality of a sorted set.
    async fn zcard(&self, key: &str) -> Result<i64>;

    /// Cursor-based key scan over a glob pattern. Implementations must
    /// never block-enumerate the whole keyspace; return a cursor of `0`
    /// to signal completion, matching Redis `SCAN` semantics.
    async fn scan(&self, pattern: &str, cursor: u64, count: usize) -> Result<(u64, Vec<String>)>;

    /// Health probe: cheap round trip used by the layered cache and the
    /// orchestrator's degraded-mode detector.
    async fn ping(&self) -> Result<()>;
}
