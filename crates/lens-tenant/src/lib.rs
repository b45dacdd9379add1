//! # Lens Tenant
//!
//! Resolves a bearer secret to a [`TenantContext`]:
//! salted hash, cache lookup, durable-store fallback, constant-time hash
//! comparison, and the inactive-tenant authentication-failure rule.

pub mod context;
pub mod hash;
pub mod resolver;

pub use context::TenantContext;
pub use resolver::TenantResolver;
