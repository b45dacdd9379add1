//! The configuration surface: every tunable the gateway reads at
//! startup, with the documented defaults baked into [`Default`].

use std::collections::HashMap;

use lens_anomaly::AnomalyKind;
use lens_quota::QuotaConfig;
use lens_ratelimit::RateLimitConfig;
use lens_types::domain::Tier;
use serde::{Deserialize, Serialize};

/// Structured vs. plain-text log output, mirroring `tracing-subscriber`'s
/// `fmt::json()` vs. default formatter split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Structured,
    Plain,
}

impl Default for LogFormat {
    fn default() -> Self {
        LogFormat::Structured
    }
}

/// Every recognized configuration option, as enumerated in the
/// "Configuration surface" section of the external interfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LensConfig {
    /// Prefixes every persisted key, letting staging and production share
    /// one substrate without collisions.
    pub environment_tag: String,
    pub log_format: LogFormat,
    pub log_level: String,

    pub kv_url: String,
    pub kv_pool_size: u32,

    pub durable_store_dsn: String,
    pub durable_pool_size: u32,

    /// Raw master secret; callers derive per-tenant keys from this via
    /// HKDF-SHA256 (never used directly as an AEAD key).
    pub master_encryption_key: String,

    pub tenant_cache_ttl_secs: u64,
    pub vendor_cred_cache_ttl_secs: u64,
    pub pricing_cache_ttl_secs: u64,

    pub default_rate_limits: HashMap<Tier, RateLimitConfig>,
    pub default_quotas: HashMap<Tier, QuotaConfig>,

    /// Seconds to suppress a repeat alert of the same (tenant, kind,
    /// metric) tuple, indexed by severity.
    pub alert_cooldown_secs: HashMap<String, u64>,

    pub anomaly_baseline_window_hours: u32,
    pub minimum_baseline_points: usize,
    /// Absolute z-score threshold per detector, matching
    /// `lens_anomaly::detector`'s hardcoded bands — carried here for
    /// operator visibility even though the detector does not yet accept
    /// a config override.
    pub anomaly_z_thresholds: HashMap<AnomalyKind, f64>,

    pub burst_subwindow_precision: u32,

    pub fail_open_rate_limiter: bool,
    pub fail_open_quota: bool,

    pub scheduled_reset_day: u32,
    pub scheduled_reset_timezone: String,
}

impl Default for LensConfig {
    fn default() -> Self {
        let mut default_rate_limits = HashMap::new();
        let mut default_quotas = HashMap::new();
        for tier in [
            Tier::Free,
            Tier::Basic,
            Tier::Premium,
            Tier::Enterprise,
            Tier::Unlimited,
        ] {
            default_rate_limits.insert(tier, RateLimitConfig::default());
            default_quotas.insert(tier, QuotaConfig::for_tier(tier));
        }

        let mut alert_cooldown_secs = HashMap::new();
        alert_cooldown_secs.insert("info".to_string(), 3600);
        alert_cooldown_secs.insert("warning".to_string(), 1800);
        alert_cooldown_secs.insert("critical".to_string(), 900);
        alert_cooldown_secs.insert("emergency".to_string(), 300);

        let mut anomaly_z_thresholds = HashMap::new();
        anomaly_z_thresholds.insert(AnomalyKind::SuddenSpike, 3.0);
        anomaly_z_thresholds.insert(AnomalyKind::SuddenDrop, 2.5);
        anomaly_z_thresholds.insert(AnomalyKind::CostAnomaly, 2.0);
        anomaly_z_thresholds.insert(AnomalyKind::PerformanceDegradation, 2.0);
        anomaly_z_thresholds.insert(AnomalyKind::ErrorSurge, 1.5);
        anomaly_z_thresholds.insert(AnomalyKind::UnusualPattern, 2.5);

        Self {
            environment_tag: "dev".to_string(),
            log_format: LogFormat::default(),
            log_level: "info".to_string(),

            kv_url: "redis://127.0.0.1:6379".to_string(),
            kv_pool_size: 16,

            durable_store_dsn: "postgres://localhost/lens".to_string(),
            durable_pool_size: 8,

            master_encryption_key: String::new(),

            tenant_cache_ttl_secs: 300,
            vendor_cred_cache_ttl_secs: 300,
            pricing_cache_ttl_secs: 3600,

            default_rate_limits,
            default_quotas,

            alert_cooldown_secs,

            anomaly_baseline_window_hours: 168,
            minimum_baseline_points: 20,
            anomaly_z_thresholds,

            burst_subwindow_precision: 10,

            fail_open_rate_limiter: true,
            fail_open_quota: false,

            scheduled_reset_day: 1,
            scheduled_reset_timezone: "UTC".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_surface() {
        let cfg = LensConfig::default();
        assert_eq!(cfg.anomaly_baseline_window_hours, 168);
        assert_eq!(cfg.minimum_baseline_points, 20);
        assert_eq!(cfg.burst_subwindow_precision, 10);
        assert!(cfg.fail_open_rate_limiter);
        assert!(!cfg.fail_open_quota);
    }

    #[test]
    fn a_rate_limit_and_quota_default_exists_for_every_tier() {
        let cfg = LensConfig::default();
        for tier in [
            Tier::Free,
            Tier::Basic,
            Tier::Premium,
            Tier::Enterprise,
            Tier::Unlimited,
        ] {
            assert!(cfg.default_rate_limits.contains_key(&tier));
            assert!(cfg.default_quotas.contains_key(&tier));
        }
    }
}
