//! Backend-agnostic collaborator traits.
//!
//! These ports let every core component depend on an interface rather
//! than a concrete Redis client or HTTP vendor call, enabling in-memory
//! fakes in tests and swapping backends without touching business logic.

pub mod durable_store;
pub mod kv;
pub mod vendor_proxy;

pub use durable_store::DurableStore;
pub use kv::KvSubstrate;
pub use vendor_proxy::{ProxyError, VendorProxy};
