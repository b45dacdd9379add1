//! `from_env` loads a [`LensConfig`] from the process environment:
//! start from [`Default`], then overlay whichever `{PREFIX}_FIELD`
//! variables are actually set, ignoring ones that fail to parse rather
//! than panicking.
//!
//! Nothing in `lens-pipeline` or the component crates calls this —
//! they're handed a `LensConfig` by value. It exists for the thin,
//! explicitly-ambient binary entry point.

use std::env;

use crate::error::ConfigError;
use crate::surface::{LensConfig, LogFormat};

impl LensConfig {
    /// Builds a config from `Self::default()` overlaid with any
    /// `{prefix}_*` environment variables that are set and parse.
    ///
    /// Fails only when `{prefix}_MASTER_ENCRYPTION_KEY` is absent or
    /// empty — every other field degrades to its documented default.
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let var = |name: &str| env::var(format!("{prefix}_{name}"));

        if let Ok(val) = var("ENVIRONMENT_TAG") {
            config.environment_tag = val;
        }
        if let Ok(val) = var("LOG_FORMAT") {
            config.log_format = match val.to_ascii_lowercase().as_str() {
                "plain" => LogFormat::Plain,
                _ => LogFormat::Structured,
            };
        }
        if let Ok(val) = var("LOG_LEVEL") {
            config.log_level = val;
        }
        if let Ok(val) = var("KV_URL") {
            config.kv_url = val;
        }
        if let Ok(val) = var("KV_POOL_SIZE") {
            if let Ok(parsed) = val.parse() {
                config.kv_pool_size = parsed;
            }
        }
        if let Ok(val) = var("DURABLE_STORE_DSN") {
            config.durable_store_dsn = val;
        }
        if let Ok(val) = var("DURABLE_POOL_SIZE") {
            if let Ok(parsed) = val.parse() {
                config.durable_pool_size = parsed;
            }
        }
        if let Ok(val) = var("TENANT_CACHE_TTL_SECS") {
            if let Ok(parsed) = val.parse() {
                config.tenant_cache_ttl_secs = parsed;
            }
        }
        if let Ok(val) = var("VENDOR_CRED_CACHE_TTL_SECS") {
            if let Ok(parsed) = val.parse() {
                config.vendor_cred_cache_ttl_secs = parsed;
            }
        }
        if let Ok(val) = var("PRICING_CACHE_TTL_SECS") {
            if let Ok(parsed) = val.parse() {
                config.pricing_cache_ttl_secs = parsed;
            }
        }
        if let Ok(val) = var("ANOMALY_BASELINE_WINDOW_HOURS") {
            if let Ok(parsed) = val.parse() {
                config.anomaly_baseline_window_hours = parsed;
            }
        }
        if let Ok(val) = var("MINIMUM_BASELINE_POINTS") {
            if let Ok(parsed) = val.parse() {
                config.minimum_baseline_points = parsed;
            }
        }
        if let Ok(val) = var("BURST_SUBWINDOW_PRECISION") {
            if let Ok(parsed) = val.parse() {
                config.burst_subwindow_precision = parsed;
            }
        }
        if let Ok(val) = var("FAIL_OPEN_RATE_LIMITER") {
            config.fail_open_rate_limiter = val.eq_ignore_ascii_case("true");
        }
        if let Ok(val) = var("FAIL_OPEN_QUOTA") {
            config.fail_open_quota = val.eq_ignore_ascii_case("true");
        }
        if let Ok(val) = var("SCHEDULED_RESET_DAY") {
            if let Ok(parsed) = val.parse() {
                config.scheduled_reset_day = parsed;
            }
        }
        if let Ok(val) = var("SCHEDULED_RESET_TIMEZONE") {
            config.scheduled_reset_timezone = val;
        }

        config.master_encryption_key = var("MASTER_ENCRYPTION_KEY").map_err(|_| {
            ConfigError::MissingRequired {
                var: format!("{prefix}_MASTER_ENCRYPTION_KEY"),
            }
        })?;
        if config.master_encryption_key.is_empty() {
            return Err(ConfigError::InvalidValue {
                var: format!("{prefix}_MASTER_ENCRYPTION_KEY"),
                reason: "must not be empty".to_string(),
            });
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // `std::env::set_var` mutates global process state; serialize tests
    // that touch it so they don't race each other.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn missing_master_key_is_an_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::remove_var("LENSTEST_MASTER_ENCRYPTION_KEY");
        let result = LensConfig::from_env("LENSTEST");
        assert!(result.is_err());
    }

    #[test]
    fn overlays_set_variables_onto_the_default() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("LENSTEST_MASTER_ENCRYPTION_KEY", "a-secret-key");
        env::set_var("LENSTEST_LOG_LEVEL", "debug");
        env::set_var("LENSTEST_KV_POOL_SIZE", "64");

        let config = LensConfig::from_env("LENSTEST").unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.kv_pool_size, 64);
        assert_eq!(config.master_encryption_key, "a-secret-key");
        // Untouched fields keep their documented default.
        assert_eq!(config.anomaly_baseline_window_hours, 168);

        env::remove_var("LENSTEST_MASTER_ENCRYPTION_KEY");
        env::remove_var("LENSTEST_LOG_LEVEL");
        env::remove_var("LENSTEST_KV_POOL_SIZE");
    }

    #[test]
    fn unparseable_numeric_override_is_ignored() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("LENSTEST_MASTER_ENCRYPTION_KEY", "a-secret-key");
        env::set_var("LENSTEST_KV_POOL_SIZE", "not-a-number");

        let config = LensConfig::from_env("LENSTEST").unwrap();
        assert_eq!(config.kv_pool_size, LensConfig::default().kv_pool_size);

        env::remove_var("LENSTEST_MASTER_ENCRYPTION_KEY");
        env::remove_var("LENSTEST_KV_POOL_SIZE");
    }
}
