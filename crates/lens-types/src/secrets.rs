//! Secure secrets handling with automatic redaction in Debug output.
//!
//! Bearer secrets, vendor credentials, and the master encryption key all
//! pass through this type so a stray `{:?}` in a log line can never leak a
//! live credential.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A string that contains sensitive data and is automatically redacted in
/// Debug output. Only the first 4 characters are shown, followed by `...`.
#[derive(Clone, Serialize, Deserialize)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// Expose the secret value. Callers must not pass the result to a
    /// logging or error-message sink.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString(\"{}\")", redact_secret(&self.0))
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

/// Redact a secret, showing only the first 4 characters.
pub fn redact_secret(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        format!("{}...", secret)
    } else {
        format!("{}...", chars[..4].iter().collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_secret() {
        let secret = SecretString::new("sk-ant-abcdefghijklmnop".to_string());
        let debug = format!("{:?}", secret);
        assert_eq!(debug, "SecretString(\"sk-a...\")");
        assert!(!debug.contains("abcdefghijklmnop"));
    }

    #[test]
    fn expose_secret_returns_full_value() {
        let secret = SecretString::new("super-secret".to_string());
        assert_eq!(secret.expose_secret(), "super-secret");
    }

    #[test]
    fn empty_secret_redacts_to_empty() {
        assert_eq!(redact_secret(""), "");
    }

    #[test]
    fn short_secret_still_gets_ellipsis() {
        assert_eq!(redact_secret("ab"), "ab...");
    }
}
