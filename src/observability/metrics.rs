//! Prometheus metrics for policy refresh and permission resolution.
//!
//! Every recording function compiles to a no-op without the `prometheus`
//! feature, so call sites never need their own `cfg` gates.

#[cfg(feature = "prometheus")]
use std::sync::OnceLock;

#[cfg(feature = "prometheus")]
use metrics::{counter, gauge, histogram};
#[cfg(feature = "prometheus")]
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::MetricsConfig;

#[cfg(feature = "prometheus")]
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder.
#[cfg(feature = "prometheus")]
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            metrics_exporter_prometheus::Matcher::Full(
                "policy_refresh_duration_seconds".to_string(),
            ),
            &config.refresh_buckets_secs,
        )
        .map_err(|e| MetricsError::Setup(e.to_string()))?
        .install_recorder()?;

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::Setup("Metrics already initialized".to_string()))?;

    Ok(())
}

/// Install the Prometheus recorder (no-op without prometheus feature).
#[cfg(not(feature = "prometheus"))]
pub fn init_metrics(_config: &MetricsConfig) -> Result<(), MetricsError> {
    Ok(())
}

/// Handle for rendering the scrape output, once [`init_metrics`] succeeded.
#[cfg(feature = "prometheus")]
pub fn prometheus_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

/// Record a memoized decision lookup.
pub fn record_decision_cache(hit: bool) {
    #[cfg(feature = "prometheus")]
    {
        let result = if hit { "hit" } else { "miss" };
        counter!("authz_decision_cache_total", "result" => result).increment(1);
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = hit;
    }
}

/// Record a refresh cycle.
///
/// `outcome` is one of "published", "fetch_error", "build_error" or "stale".
pub fn record_policy_refresh(outcome: &'static str, duration_secs: f64) {
    #[cfg(feature = "prometheus")]
    {
        counter!("policy_refresh_total", "outcome" => outcome).increment(1);
        histogram!("policy_refresh_duration_seconds", "outcome" => outcome).record(duration_secs);
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = (outcome, duration_secs);
    }
}

/// Record the shape of a newly published snapshot.
pub fn record_policy_snapshot(version: u64, roles: usize, bindings: usize, dropped_bindings: usize) {
    #[cfg(feature = "prometheus")]
    {
        gauge!("policy_snapshot_version").set(version as f64);
        gauge!("policy_roles").set(roles as f64);
        gauge!("policy_role_bindings").set(bindings as f64);
        counter!("policy_dropped_bindings_total").increment(dropped_bindings as u64);
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = (version, roles, bindings, dropped_bindings);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Failed to set up metrics: {0}")]
    Setup(String),

    #[cfg(feature = "prometheus")]
    #[error("Failed to install metrics recorder: {0}")]
    Install(#[from] metrics_exporter_prometheus::BuildError),
}
