//! AEAD envelope format: `version || nonce || ciphertext+tag`, base64-framed.
//!
//! Version 1 is the only format this crate writes; the leading byte is
//! kept so a future cipher change does not have to delete history on
//! read.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use lens_types::error::{LensError, Result};

const FORMAT_VERSION: u8 = 1;
const NONCE_LEN: usize = 12;

/// Encrypt `plaintext` under `key`, returning the base64-framed envelope.
pub fn seal(key: &[u8; 32], plaintext: &[u8]) -> String {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .expect("AES-256-GCM encryption over an in-memory buffer cannot fail");

    let mut framed = Vec::with_capacity(1 + NONCE_LEN + ciphertext.len());
    framed.push(FORMAT_VERSION);
    framed.extend_from_slice(&nonce);
    framed.extend_from_slice(&ciphertext);
    STANDARD.encode(framed)
}

/// Decrypt an envelope produced by [`seal`]. Any tampering, wrong key, or
/// malformed framing surfaces as [`LensError::CryptoAuthFailed`] — never a
/// silently-wrong plaintext.
pub fn open(key: &[u8; 32], envelope: &str) -> Result<Vec<u8>> {
    let framed = STANDARD
        .decode(envelope)
        .map_err(|_| LensError::CryptoAuthFailed)?;

    if framed.len() < 1 + NONCE_LEN {
        return Err(LensError::CryptoAuthFailed);
    }
    let (header, rest) = framed.split_at(1);
    if header[0] != FORMAT_VERSION {
        return Err(LensError::CryptoAuthFailed);
    }
    let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| LensError::CryptoAuthFailed)
}
