//! Error types for the API Lens gateway.
//!
//! A unified error type using `thiserror`, mirroring the seven propagation
//! policies described in the metering pipeline's error handling design:
//! unauthenticated, rate-limited, quota-exceeded, credential-missing,
//! upstream-error, substrate-transient, and internal.

use thiserror::Error;

/// Result type alias using [`LensError`].
pub type Result<T> = std::result::Result<T, LensError>;

/// The seven error kinds the pipeline distinguishes, each with a fixed
/// propagation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthenticated,
    RateLimited,
    QuotaExceeded,
    CredentialMissing,
    UpstreamError,
    SubstrateTransient,
    Internal,
}

/// Main error type for API Lens operations.
#[derive(Error, Debug)]
pub enum LensError {
    /// Tenant resolution found no tenant for the presented secret, or the tenant is inactive.
    #[error("authentication failed")]
    Unauthenticated,

    /// The rate limiter denied admission under the sliding-window or burst policy.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: i64 },

    /// The quota pre-check denied the request; auto-block is on and grace has elapsed.
    #[error("quota exceeded: {reason}")]
    QuotaExceeded { reason: String },

    /// The credential store has no active credential for the requested vendor.
    #[error("no active credential for vendor {vendor}")]
    CredentialMissing { vendor: String },

    /// The vendor proxy reported a non-success status.
    #[error("upstream error from {vendor}: {status}")]
    UpstreamError { vendor: String, status: u16 },

    /// A K/V substrate or durable-store operation failed transiently.
    #[error("substrate unavailable: {0}")]
    SubstrateTransient(String),

    /// An invariant was violated (decryption auth failure, malformed record).
    #[error("internal invariant violated: {0}")]
    Internal(String),

    /// A cryptographic authentication check failed (AEAD tag mismatch,
    /// cross-tenant decryption attempt). Surfaced at error level, never
    /// silently divergent.
    #[error("cryptographic authentication failed")]
    CryptoAuthFailed,

    /// Requested resource was not found in cache or durable store.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid configuration supplied at construction time.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Redis/K-V client error, wrapped transparently.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all for interop with `anyhow`-based collaborators.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LensError {
    /// Classify this error into one of the seven propagation-policy buckets.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LensError::Unauthenticated => ErrorKind::Unauthenticated,
            LensError::RateLimited { .. } => ErrorKind::RateLimited,
            LensError::QuotaExceeded { .. } => ErrorKind::QuotaExceeded,
            LensError::CredentialMissing { .. } => ErrorKind::CredentialMissing,
            LensError::UpstreamError { .. } => ErrorKind::UpstreamError,
            LensError::Redis(_) | LensError::SubstrateTransient(_) => {
                ErrorKind::SubstrateTransient
            }
            LensError::CryptoAuthFailed
            | LensError::Internal(_)
            | LensError::NotFound(_)
            | LensError::Configuration(_)
            | LensError::Json(_)
            | LensError::Io(_)
            | LensError::Other(_) => ErrorKind::Internal,
        }
    }

    /// Whether a caller may retry this operation unmodified.
    ///
    /// Only substrate-transient failures are retryable; everything else
    /// requires the caller to change something first (wait out a cooldown,
    /// fix credentials, wait for quota reset).
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::SubstrateTransient)
    }

    /// Build a human-readable message with no internal details, suitable
    /// for a user-visible error envelope.
    pub fn user_message(&self) -> String {
        match self {
            LensError::Unauthenticated => "authentication failed".to_string(),
            LensError::RateLimited { retry_after_secs } => {
                format!("rate limit exceeded, retry in {retry_after_secs}s")
            }
            LensError::QuotaExceeded { .. } => "quota exceeded for this period".to_string(),
            LensError::CredentialMissing { vendor } => {
                format!("no credential configured for {vendor}")
            }
            LensError::UpstreamError { vendor, status } => {
                format!("{vendor} returned status {status}")
            }
            _ => "internal error, please retry".to_string(),
        }
    }

    pub fn substrate_transient<S: Into<String>>(msg: S) -> Self {
        LensError::SubstrateTransient(msg.into())
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        LensError::Internal(msg.into())
    }
}
