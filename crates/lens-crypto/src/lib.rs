//! # Lens Crypto
//!
//! The per-tenant credential store: HKDF-SHA256 key
//! derivation from a single master secret, AES-256-GCM envelope
//! encryption at rest, and rotation history tracking.

pub mod cipher;
pub mod kdf;
pub mod store;

pub use store::CredentialStore;
