//! The pipeline's response envelope and the seven-way admission outcome
//!

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::time::Duration;

/// How the pipeline disposed of a request. Exactly one of these fires
/// per run, matching the seven error kinds plus the successful path
/// and the cancellation terminal state.
#[derive(Debug, Clone, PartialEq)]
pub enum AdmissionOutcome {
    Admitted,
    Unauthenticated,
    RateLimited { retry_after_secs: i64 },
    QuotaExceeded { reason: String },
    CredentialMissing { vendor: String },
    UpstreamError { vendor: String, status: u16 },
    Cancelled,
    Internal(String),
}

impl AdmissionOutcome {
    pub fn is_admitted(&self) -> bool {
        matches!(self, AdmissionOutcome::Admitted)
    }
}

/// What a completed (or short-circuited) pipeline run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub admission: AdmissionOutcome,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub stage_latencies: BTreeMap<String, Duration>,
    pub tenant_id: Option<String>,
    pub cost: Option<Decimal>,
    pub alert_ids: Vec<String>,
    pub anomaly_scan_scheduled: bool,
}

impl PipelineOutcome {
    pub fn short_circuit(admission: AdmissionOutcome, status: u16) -> Self {
        PipelineOutcome {
            admission,
            status,
            headers: Vec::new(),
            body: Vec::new(),
            stage_latencies: BTreeMap::new(),
            tenant_id: None,
            cost: None,
            alert_ids: Vec::new(),
            anomaly_scan_scheduled: false,
        }
    }
}
