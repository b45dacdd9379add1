//! Deterministic anomaly identifiers: identical inputs produce the
//! same identifier, so a re-run never duplicates.

use crate::kind::AnomalyKind;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

pub fn anomaly_id(tenant_id: &str, kind: AnomalyKind, detected_at: DateTime<Utc>) -> String {
    let data = format!("{tenant_id}_{}_{}", kind.as_str(), detected_at.to_rfc3339());
    let digest = Sha256::digest(data.as_bytes());
    hex::encode(&digest[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn identical_inputs_produce_the_same_id() {
        let t = Utc.with_ymd_and_hms(2026, 3, 15, 10, 0, 0).unwrap();
        let a = anomaly_id("tenant-1", AnomalyKind::SuddenSpike, t);
        let b = anomaly_id("tenant-1", AnomalyKind::SuddenSpike, t);
        assert_eq!(a, b);
    }

    #[test]
    fn different_kind_produces_a_different_id() {
        let t = Utc.with_ymd_and_hms(2026, 3, 15, 10, 0, 0).unwrap();
        let a = anomaly_id("tenant-1", AnomalyKind::SuddenSpike, t);
        let b = anomaly_id("tenant-1", AnomalyKind::SuddenDrop, t);
        assert_ne!(a, b);
    }
}
