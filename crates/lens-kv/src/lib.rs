//! # Lens K/V
//!
//! The shared K/V substrate client: connection pooling,
//! pipelined batch operations, and scripted atomic counters against an
//! external key/value store (Redis-compatible) with TTL and sorted-set
//! primitives.
//!
//! Two implementations of [`lens_types::ports::KvSubstrate`] live here:
//! [`redis_substrate::RedisSubstrate`] for production, and
//! [`memory::InMemorySubstrate`] for tests that want real sliding-window
//! and cache behavior without a live Redis server.

pub mod memory;
pub mod redis_substrate;

pub use memory::InMemorySubstrate;
pub use redis_substrate::RedisSubstrate;
