//! Per-tenant key derivation.
//!
//! A single master secret, held only by the process that runs this
//! crate, is expanded into one 32-byte key per tenant isolation
//! namespace via HKDF-SHA256. Deterministic by construction: the same
//! (master secret, namespace) pair always yields the same key, which is
//! what lets us re-derive the key at decrypt time instead of storing it.

use hkdf::Hkdf;
use sha2::Sha256;

const KEY_LEN: usize = 32;
const INFO_CONTEXT: &[u8] = b"api-lens/credential-key/v1";

/// Derive the 32-byte AEAD key for `isolation_namespace` from
/// `master_secret`. The namespace is used as the HKDF salt, so two
/// namespaces sharing the same master secret derive unrelated keys.
pub fn derive_tenant_key(master_secret: &[u8], isolation_namespace: &str) -> [u8; KEY_LEN] {
    let hk = Hkdf::<Sha256>::new(Some(isolation_namespace.as_bytes()), master_secret);
    let mut okm = [0u8; KEY_LEN];
    hk.expand(INFO_CONTEXT, &mut okm)
        .expect("32 bytes is a valid HKDF-SHA256 output length");
    okm
}
