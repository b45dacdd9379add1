//! The fixed key pattern set, and the tenant-scoped subset used by
//! `invalidate_tenant`.

/// Build the `tenant:<id>` key (note: production callers hash the API
/// secret themselves — this crate is agnostic to how `id` was derived).
pub fn tenant(id: &str) -> String {
    format!("tenant:{id}")
}

pub fn vendor_cred(tenant_id: &str, vendor: &str) -> String {
    format!("vendor-cred:{tenant_id}:{vendor}")
}

pub fn pricing(vendor: &str, model: &str) -> String {
    format!("pricing:{vendor}:{model}")
}

pub fn rate_limit(tenant_id: &str, class: &str, window: &str) -> String {
    format!("ratelimit:{tenant_id}:{class}:{window}")
}

pub fn rate_limit_config(tenant_id: &str) -> String {
    format!("ratelimit-config:{tenant_id}")
}

pub fn quota(tenant_id: &str, period: &str, ts: i64) -> String {
    format!("quota:{tenant_id}:{period}:{ts}")
}

/// Real-time cost-tracker counter, distinct from `quota`'s enforcement
/// counters: this is observability/projection bookkeeping over fixed
/// hour/day/month buckets, not the configured-cap periods the quota
/// accountant enforces.
pub fn cost_counter(tenant_id: &str, period: &str, ts: i64) -> String {
    format!("cost-counter:{tenant_id}:{period}:{ts}")
}

/// Per-(tenant, alert-kind) cooldown latch: while this key is present, a
/// repeat crossing of the same alert kind is suppressed; its TTL is the
/// cooldown window itself, not the enforcement period's TTL, so a
/// cooldown from one day never bleeds into the next.
pub fn alert_cooldown(tenant_id: &str, kind: &str) -> String {
    format!("quota:alert-cooldown:{tenant_id}:{kind}")
}

pub fn anomaly(tenant_id: &str, kind: &str, ts: i64) -> String {
    format!("anomaly:{tenant_id}:{kind}:{ts}")
}

/// Timestamp (unix seconds) of the tenant's last out-of-band anomaly
/// scan, used by the orchestrator to decide whether a rescan is due.
pub fn anomaly_check(tenant_id: &str) -> String {
    format!("anomaly-check:{tenant_id}")
}

/// Every scan pattern that could contain `tenant_id`, for
/// `invalidate_tenant`. Each pattern uses a single trailing/embedded `*`
/// so it is compatible with the substrate's cursor `SCAN ... MATCH`.
pub fn tenant_patterns(tenant_id: &str) -> Vec<String> {
    vec![
        format!("tenant:{tenant_id}"),
        format!("vendor-cred:{tenant_id}:*"),
        format!("ratelimit:{tenant_id}:*"),
        format!("ratelimit-config:{tenant_id}"),
        format!("quota:{tenant_id}:*"),
        format!("quota:alert-cooldown:{tenant_id}:*"),
        format!("cost-counter:{tenant_id}:*"),
        format!("anomaly:{tenant_id}:*"),
        format!("anomaly-check:{tenant_id}"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_patterns_match_the_fixed_set() {
        assert_eq!(tenant("abc"), "tenant:abc");
        assert_eq!(vendor_cred("t1", "openai"), "vendor-cred:t1:openai");
        assert_eq!(pricing("openai", "gpt-4"), "pricing:openai:gpt-4");
        assert_eq!(rate_limit("t1", "minute", "42"), "ratelimit:t1:minute:42");
        assert_eq!(quota("t1", "monthly", 1000), "quota:t1:monthly:1000");
        assert_eq!(anomaly("t1", "spike", 1000), "anomaly:t1:spike:1000");
    }

    #[test]
    fn tenant_patterns_cover_every_per_tenant_namespace() {
        let patterns = tenant_patterns("t1");
        assert!(patterns.iter().any(|p| p == "tenant:t1"));
        assert!(patterns.iter().any(|p| p.starts_with("vendor-cred:t1:")));
        assert!(patterns.iter().any(|p| p.starts_with("ratelimit:t1:")));
        assert!(patterns.iter().any(|p| p.starts_with("quota:t1:")));
        assert!(patterns.iter().any(|p| p.starts_with("anomaly:t1:")));
    }
}
