//! The request pipeline orchestrator: composes the tenant resolver,
//! rate limiter, quota accountant, credential store, vendor proxy,
//! usage parser, pricing engine, cost tracker, and anomaly detector in
//! a fixed order.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use lens_anomaly::AnomalyDetector;
use lens_cost::{CostPeriod, CostTracker};
use lens_crypto::CredentialStore;
use lens_pricing::PricingResolver;
use lens_quota::{PreCheckDecision, QuotaAccountant};
use lens_ratelimit::{Decision as RateDecision, RateLimiter};
use lens_tenant::TenantResolver;
use lens_types::cancellation::Deadline;
use lens_types::domain::WindowClass;
use lens_types::ports::durable_store::DurableStore;
use lens_types::ports::kv::KvSubstrate;
use lens_types::ports::vendor_proxy::{ProxyError, VendorProxy};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::outcome::{AdmissionOutcome, PipelineOutcome};
use crate::request::PipelineRequest;

/// How long a tenant's out-of-band anomaly scan result stays valid
/// before the next request triggers another one.
const ANOMALY_RECHECK_INTERVAL: Duration = Duration::from_secs(3600);

pub struct PipelineOrchestrator {
    tenants: Arc<TenantResolver>,
    rate_limiter: Arc<RateLimiter>,
    quota: Arc<QuotaAccountant>,
    credentials: Arc<CredentialStore>,
    proxy: Arc<dyn VendorProxy>,
    vendor_registry: Arc<lens_vendor::VendorRegistry>,
    pricing: Arc<PricingResolver>,
    cost_tracker: Arc<CostTracker>,
    anomaly_detector: Arc<AnomalyDetector>,
    durable: Arc<dyn DurableStore>,
    kv: Arc<dyn KvSubstrate>,
}

impl PipelineOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tenants: Arc<TenantResolver>,
        rate_limiter: Arc<RateLimiter>,
        quota: Arc<QuotaAccountant>,
        credentials: Arc<CredentialStore>,
        proxy: Arc<dyn VendorProxy>,
        vendor_registry: Arc<lens_vendor::VendorRegistry>,
        pricing: Arc<PricingResolver>,
        cost_tracker: Arc<CostTracker>,
        anomaly_detector: Arc<AnomalyDetector>,
        durable: Arc<dyn DurableStore>,
        kv: Arc<dyn KvSubstrate>,
    ) -> Self {
        PipelineOrchestrator {
            tenants,
            rate_limiter,
            quota,
            credentials,
            proxy,
            vendor_registry,
            pricing,
            cost_tracker,
            anomaly_detector,
            durable,
            kv,
        }
    }

    #[instrument(skip(self, request, deadline), fields(vendor = %request.vendor))]
    pub async fn run(&self, request: PipelineRequest, deadline: Deadline) -> PipelineOutcome {
        let mut latencies: BTreeMap<String, Duration> = BTreeMap::new();
        let fingerprint = request.fingerprint();

        // 1. Tenant resolution.
        let stage_start = Instant::now();
        let tenant_ctx = match self.tenants.resolve(&request.bearer_secret, &deadline).await {
            Ok(ctx) => ctx,
            Err(err) => {
                info!(error = %err, fingerprint, "authentication failed");
                return PipelineOutcome::short_circuit(AdmissionOutcome::Unauthenticated, 401);
            }
        };
        latencies.insert("tenant_resolve".to_string(), stage_start.elapsed());
        let tenant_id = tenant_ctx.tenant_id.clone();

        // 2. Rate limiting across every configured window class, fail-open
        // on substrate error. Checked narrowest-first so a tight per-minute
        // cap is reported before a looser monthly one would even matter.
        let stage_start = Instant::now();
        let mut rate_limited = None;
        for class in [WindowClass::Minute, WindowClass::Hour, WindowClass::Day, WindowClass::Month] {
            let decision = self.rate_limiter.check(&tenant_id, class, &deadline).await;
            if let RateDecision::RateLimited { retry_after_secs } = decision {
                rate_limited = Some(retry_after_secs);
                break;
            }
        }
        latencies.insert("rate_limit".to_string(), stage_start.elapsed());
        if let Some(retry_after_secs) = rate_limited {
            return self.finish_short_circuit(
                AdmissionOutcome::RateLimited { retry_after_secs },
                429,
                Some(tenant_id),
                latencies,
            );
        }

        // 3. Quota pre-check.
        let stage_start = Instant::now();
        let pre_check = match self.quota.pre_check(&tenant_id, &deadline).await {
            Ok(decision) => decision,
            Err(err) => {
                warn!(error = %err, "quota pre-check failed, admitting (fail-open)");
                PreCheckDecision::Admitted
            }
        };
        latencies.insert("quota_pre_check".to_string(), stage_start.elapsed());
        if let PreCheckDecision::QuotaExceeded { reason } = pre_check {
            return self.finish_short_circuit(
                AdmissionOutcome::QuotaExceeded { reason },
                429,
                Some(tenant_id),
                latencies,
            );
        }

        // 4. Credential resolution.
        let stage_start = Instant::now();
        let vendor_str = request.vendor.to_string();
        let credential = match self.credentials.fetch(&tenant_id, &vendor_str, &deadline).await {
            Ok(cred) => cred,
            Err(err) => {
                warn!(error = %err, "credential lookup failed");
                return self.finish_short_circuit(
                    AdmissionOutcome::Internal(err.to_string()),
                    500,
                    Some(tenant_id),
                    latencies,
                );
            }
        };
        latencies.insert("credential_fetch".to_string(), stage_start.elapsed());
        let Some(credential) = credential else {
            return self.finish_short_circuit(
                AdmissionOutcome::CredentialMissing { vendor: vendor_str },
                424,
                Some(tenant_id),
                latencies,
            );
        };

        // 5. Upstream vendor call.
        let stage_start = Instant::now();
        let proxy_result = self
            .proxy
            .call(&vendor_str, &request.model, &credential, &request.body, &deadline)
            .await;
        latencies.insert("vendor_call".to_string(), stage_start.elapsed());

        let response = match proxy_result {
            Ok(response) => response,
            Err(ProxyError::Cancelled) => {
                // No partial bytes are available through this port, so
                // there's nothing billable, but the cost tracker still
                // needs a zero-usage record so its hourly/daily/monthly
                // counters reflect that this request happened at all.
                let now = Utc::now();
                if let Err(err) = self.cost_tracker.record(&tenant_id, rust_decimal::Decimal::ZERO, now).await {
                    warn!(error = %err, "zero-usage cost record failed after cancellation");
                }
                return self.finish_short_circuit(
                    AdmissionOutcome::Cancelled,
                    499,
                    Some(tenant_id),
                    latencies,
                );
            }
            Err(err) => {
                let (status, outcome) = classify_proxy_error(&vendor_str, &err);
                return self.finish_short_circuit(outcome, status, Some(tenant_id), latencies);
            }
        };

        // 6. Usage parsing.
        let stage_start = Instant::now();
        let body_json = serde_json::from_slice(&response.body).unwrap_or(serde_json::Value::Null);
        let usage = self.vendor_registry.parse(&request.vendor, &request.model, &body_json);
        latencies.insert("usage_parse".to_string(), stage_start.elapsed());

        // 7. Pricing and cost; real-time cost counters.
        let stage_start = Instant::now();
        let now = Utc::now();
        let pricing_record = match self.pricing.resolve(&vendor_str, &request.model, &deadline).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                return self.finish_short_circuit(
                    AdmissionOutcome::Internal(format!(
                        "no pricing record for {vendor_str}/{}",
                        request.model
                    )),
                    500,
                    Some(tenant_id),
                    latencies,
                );
            }
            Err(err) => {
                // Charging without a price is worse than refusing: the
                // cost engine fails closed on its own substrate errors.
                warn!(error = %err, "pricing lookup failed, failing closed");
                return self.finish_short_circuit(
                    AdmissionOutcome::Internal(err.to_string()),
                    500,
                    Some(tenant_id),
                    latencies,
                );
            }
        };
        let current_monthly_cost = self
            .cost_tracker
            .get(&tenant_id, CostPeriod::Monthly, now)
            .await
            .unwrap_or(rust_decimal::Decimal::ZERO);
        let breakdown = lens_pricing::calculate(&pricing_record, usage.input_units, usage.output_units, current_monthly_cost);
        if let Err(err) = self.cost_tracker.record(&tenant_id, breakdown.total_cost, now).await {
            warn!(error = %err, "real-time cost counter update failed");
        }
        let projection_alert = self.check_projection_alert(&tenant_id, current_monthly_cost + breakdown.total_cost, now, &deadline).await;
        latencies.insert("pricing_and_cost".to_string(), stage_start.elapsed());

        // 8. Quota post-update.
        let stage_start = Instant::now();
        let post_update = match self.quota.post_update(&tenant_id, breakdown.total_cost, &deadline).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "quota post-update failed");
                lens_quota::PostUpdateOutcome::default()
            }
        };
        latencies.insert("quota_post_update".to_string(), stage_start.elapsed());

        let mut alert_ids: Vec<String> = post_update
            .alerts
            .iter()
            .map(|a| format!("{}:{:?}:{}", tenant_id, a.period, a.metric))
            .collect();
        for alert in &post_update.alerts {
            let _ = self.durable.append_alert(serde_json::to_value(alert).unwrap_or(json!({})), &deadline).await;
        }
        if let Some(alert) = &projection_alert {
            alert_ids.push(format!("{tenant_id}:projection_high"));
            let _ = self.durable.append_alert(alert.clone(), &deadline).await;
        }

        let telemetry = json!({
            "tenant_id": tenant_id,
            "fingerprint": fingerprint,
            "vendor": vendor_str,
            "model": request.model,
            "client_id": request.client_id,
            "client_observed_at": request.client_observed_at,
            "status": response.status,
            "input_units": usage.input_units,
            "output_units": usage.output_units,
            "total_cost": breakdown.total_cost,
            "alert_count": post_update.alerts.len(),
            "blocked": post_update.blocked,
            "upstream_latency_ms": response.upstream_latency.as_millis() as u64,
            "stage_latencies_ms": latencies.iter().map(|(k, v)| (k.clone(), v.as_millis() as u64)).collect::<BTreeMap<_, _>>(),
            "detected_at": now,
        });
        if let Err(err) = self.durable.append_telemetry(telemetry, &deadline).await {
            warn!(error = %err, "telemetry append failed");
        }

        // 9. Schedule an anomaly scan out-of-band if the tenant's last check is stale.
        let anomaly_scan_scheduled = self.maybe_schedule_anomaly_scan(&tenant_id, now).await;

        PipelineOutcome {
            admission: AdmissionOutcome::Admitted,
            status: response.status,
            headers: response.headers,
            body: response.body,
            stage_latencies: latencies,
            tenant_id: Some(tenant_id),
            cost: Some(breakdown.total_cost),
            alert_ids,
            anomaly_scan_scheduled,
        }
    }

    fn finish_short_circuit(
        &self,
        admission: AdmissionOutcome,
        status: u16,
        tenant_id: Option<String>,
        latencies: BTreeMap<String, Duration>,
    ) -> PipelineOutcome {
        PipelineOutcome {
            admission,
            status,
            headers: Vec::new(),
            body: Vec::new(),
            stage_latencies: latencies,
            tenant_id,
            cost: None,
            alert_ids: Vec::new(),
            anomaly_scan_scheduled: false,
        }
    }

    /// Projects this tenant's end-of-month cost and, if it crosses 90% of
    /// the monthly cap, returns an alert record — gated by its own
    /// cooldown latch so a tenant riding the line doesn't get one alert
    /// per request. `None` on substrate failure or when nothing crosses.
    async fn check_projection_alert(
        &self,
        tenant_id: &str,
        updated_monthly_cost: rust_decimal::Decimal,
        now: chrono::DateTime<Utc>,
        deadline: &Deadline,
    ) -> Option<serde_json::Value> {
        let daily_costs = self.cost_tracker.daily_history(tenant_id, now).await.unwrap_or_default();
        let projection = lens_cost::project(updated_monthly_cost, now, &daily_costs);
        let cap = self.quota.monthly_cost_cap(tenant_id, deadline).await.ok()?;
        if !lens_cost::is_high(&projection, cap) {
            return None;
        }

        let cooldown_key = lens_cache::keys::alert_cooldown(tenant_id, "cost_projection");
        if self.kv.get(&cooldown_key).await.ok()?.is_some() {
            return None;
        }
        let _ = self.kv.set(&cooldown_key, b"1", ANOMALY_RECHECK_INTERVAL).await;

        Some(json!({
            "tenant_id": tenant_id,
            "kind": "projection_high",
            "projected_monthly_cost": projection.projected_monthly_cost,
            "monthly_cap": cap,
            "confidence_score": projection.confidence_score,
            "triggered_at": now,
        }))
    }

    /// Checks (and, if stale, refreshes) the tenant's last-anomaly-scan
    /// timestamp, spawning the scan out-of-band so it never adds to this
    /// request's latency.
    async fn maybe_schedule_anomaly_scan(&self, tenant_id: &str, now: chrono::DateTime<Utc>) -> bool {
        let key = lens_cache::keys::anomaly_check(tenant_id);
        let last_check = match self.kv.get(&key).await {
            Ok(Some(bytes)) => std::str::from_utf8(&bytes).ok().and_then(|s| s.parse::<i64>().ok()),
            _ => None,
        };
        let due = match last_check {
            Some(ts) => now.timestamp() - ts >= ANOMALY_RECHECK_INTERVAL.as_secs() as i64,
            None => true,
        };
        if !due {
            return false;
        }
        let _ = self
            .kv
            .set(&key, now.timestamp().to_string().as_bytes(), ANOMALY_RECHECK_INTERVAL * 2)
            .await;

        let detector = Arc::clone(&self.anomaly_detector);
        let durable = Arc::clone(&self.durable);
        let tenant_id = tenant_id.to_string();
        tokio::spawn(async move {
            let deadline = Deadline::after(Duration::from_secs(30));
            match detector.detect(&tenant_id, now, &deadline).await {
                Ok(anomalies) => {
                    for anomaly in anomalies {
                        if let Ok(value) = serde_json::to_value(&anomaly) {
                            let _ = durable.append_anomaly(value, &deadline).await;
                        }
                    }
                }
                Err(err) => warn!(error = %err, tenant_id, "out-of-band anomaly scan failed"),
            }
        });
        true
    }
}

fn classify_proxy_error(vendor: &str, err: &ProxyError) -> (u16, AdmissionOutcome) {
    match err {
        ProxyError::Transport(msg) => (502, AdmissionOutcome::Internal(format!("vendor unreachable: {msg}"))),
        ProxyError::UpstreamAuth => (401, AdmissionOutcome::UpstreamError { vendor: vendor.to_string(), status: 401 }),
        ProxyError::UpstreamRateLimited { .. } => {
            (429, AdmissionOutcome::UpstreamError { vendor: vendor.to_string(), status: 429 })
        }
        ProxyError::UpstreamServer { status } => {
            (*status, AdmissionOutcome::UpstreamError { vendor: vendor.to_string(), status: *status })
        }
        ProxyError::UpstreamClient { status } => {
            (*status, AdmissionOutcome::UpstreamError { vendor: vendor.to_string(), status: *status })
        }
        ProxyError::Cancelled => unreachable!("handled by caller before classification"),
    }
}
