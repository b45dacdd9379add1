//! Vendor proxy collaborator port
//!
//! Wire framing and the actual TLS/transport to vendors lives outside the
//! core; the orchestrator only ever calls this trait, passing the
//! tenant's decrypted credential and a deadline.

use crate::cancellation::Deadline;
use crate::secrets::SecretString;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors a vendor proxy call can report, distinguished so the
/// orchestrator can apply the right handling to each.
#[derive(Error, Debug, Clone)]
pub enum ProxyError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("upstream rejected credential")]
    UpstreamAuth,
    #[error("upstream rate limited, retry after {retry_after_secs}s")]
    UpstreamRateLimited { retry_after_secs: i64 },
    #[error("upstream server error: status {status}")]
    UpstreamServer { status: u16 },
    #[error("upstream client error: status {status}")]
    UpstreamClient { status: u16 },
    #[error("call cancelled before completion")]
    Cancelled,
}

/// The response envelope returned by a vendor call.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub upstream_latency: Duration,
}

/// Backend-agnostic vendor proxy interface.
#[async_trait]
pub trait VendorProxy: Send + Sync {
    async fn call(
        &self,
        vendor: &str,
        model: &str,
        credential_plaintext: &SecretString,
        request_bytes: &[u8],
        deadline: &Deadline,
    ) -> Result<ProxyResponse, ProxyError>;
}
