//! Salted hashing and constant-time comparison for bearer secrets.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// SHA-256 of `secret || pepper`, hex-encoded. The pepper is a
/// deployment-wide value (not per-tenant) held only by this process, so
/// a leaked durable-store snapshot alone can't be used to brute-force
/// valid bearer secrets offline.
pub fn hash_secret(secret: &str, pepper: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(pepper);
    hex::encode(hasher.finalize())
}

/// Compare two hash strings in constant time with respect to their
/// content (early-exit on length mismatch is fine: lengths of hex SHA-256
/// digests are fixed and public).
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
