//! The inbound request surface the orchestrator consumes

use chrono::{DateTime, Utc};
use lens_types::domain::VendorTag;
use lens_types::secrets::SecretString;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub bearer_secret: SecretString,
    pub vendor: VendorTag,
    pub model: String,
    pub method: String,
    pub path: String,
    pub body: Vec<u8>,
    pub client_observed_at: DateTime<Utc>,
    pub client_id: Option<String>,
}

impl PipelineRequest {
    /// A stable hash of method, path, and a digest of the body — carried
    /// through the pipeline for telemetry correlation, never the body
    /// itself.
    pub fn fingerprint(&self) -> String {
        let body_digest = hex::encode(Sha256::digest(&self.body));
        let data = format!("{}:{}:{}", self.method, self.path, body_digest);
        hex::encode(Sha256::digest(data.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(body: &[u8]) -> PipelineRequest {
        PipelineRequest {
            bearer_secret: SecretString::from("sk-live-abc"),
            vendor: VendorTag::OpenAi,
            model: "gpt-4".to_string(),
            method: "POST".to_string(),
            path: "/v1/chat/completions".to_string(),
            body: body.to_vec(),
            client_observed_at: Utc::now(),
            client_id: None,
        }
    }

    #[test]
    fn identical_requests_fingerprint_identically() {
        let a = request(b"{\"prompt\":\"hi\"}");
        let b = request(b"{\"prompt\":\"hi\"}");
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn different_bodies_fingerprint_differently() {
        let a = request(b"{\"prompt\":\"hi\"}");
        let b = request(b"{\"prompt\":\"bye\"}");
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
