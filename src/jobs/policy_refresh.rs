//! Policy refresh worker.
//!
//! Each cycle fetches roles, role bindings and group rosters, builds a new
//! [`PolicySnapshot`] and publishes it. The worker is resilient:
//! - A failed fetch or an invalid document is logged and the previously
//!   published snapshot stays in force
//! - The initial refresh runs immediately on startup
//! - A refresh request wakes the worker before the interval elapses

use std::{sync::Arc, time::Instant};

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::{
    authz::{PolicyBuildError, PolicyRegistry, PolicySnapshot, PublishError},
    config::PolicyConfig,
    observability::metrics,
    sources::{GroupRoster, PolicyStore, SourceError},
};

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("Failed to fetch policy: {0}")]
    Fetch(#[from] SourceError),

    #[error("Invalid policy document: {0}")]
    Build(#[from] PolicyBuildError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl RefreshError {
    fn outcome(&self) -> &'static str {
        match self {
            RefreshError::Fetch(_) => "fetch_error",
            RefreshError::Build(_) => "build_error",
            RefreshError::Publish(_) => "stale",
        }
    }
}

/// Results from a single refresh run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshRunResult {
    /// Version of the published snapshot.
    pub version: u64,
    pub roles: usize,
    pub bindings: usize,
    pub groups: usize,
    /// Bindings dropped because they reference an unknown role.
    pub dropped_bindings: usize,
    /// Duration of the refresh in milliseconds.
    pub duration_ms: u64,
}

/// Run a single refresh pass: fetch, build and publish.
///
/// On error nothing is published.
pub async fn run_refresh(
    registry: &PolicyRegistry,
    store: &dyn PolicyStore,
    roster: &dyn GroupRoster,
) -> Result<RefreshRunResult, RefreshError> {
    let start = Instant::now();
    let result = refresh_once(registry, store, roster, start).await;

    let elapsed = start.elapsed().as_secs_f64();
    match &result {
        Ok(_) => metrics::record_policy_refresh("published", elapsed),
        Err(e) => metrics::record_policy_refresh(e.outcome(), elapsed),
    }
    result
}

async fn refresh_once(
    registry: &PolicyRegistry,
    store: &dyn PolicyStore,
    roster: &dyn GroupRoster,
    start: Instant,
) -> Result<RefreshRunResult, RefreshError> {
    // Roles and bindings come from one read so bindings never dangle on a
    // half-updated store
    let (mut document, groups) =
        tokio::try_join!(store.fetch_document(), roster.fetch_groups())?;
    document.groups = groups;

    let version = registry.next_version();
    let (snapshot, report) = PolicySnapshot::build(document, version)?;
    registry.publish(snapshot)?;

    metrics::record_policy_snapshot(
        version,
        report.roles,
        report.bindings,
        report.dropped_bindings.len(),
    );

    Ok(RefreshRunResult {
        version,
        roles: report.roles,
        bindings: report.bindings,
        groups: report.groups,
        dropped_bindings: report.dropped_bindings.len(),
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Starts the policy refresh worker. Spawn it as a background task.
///
/// Runs until `shutdown` is cancelled.
pub async fn start_policy_refresh_worker(
    registry: Arc<PolicyRegistry>,
    store: Arc<dyn PolicyStore>,
    roster: Arc<dyn GroupRoster>,
    config: PolicyConfig,
    shutdown: CancellationToken,
) {
    tracing::info!(
        refresh_interval_secs = config.refresh_interval_secs,
        "Starting policy refresh worker"
    );

    let interval = config.refresh_interval();

    match run_refresh(&registry, store.as_ref(), roster.as_ref()).await {
        Ok(result) => {
            tracing::info!(
                version = result.version,
                roles = result.roles,
                bindings = result.bindings,
                groups = result.groups,
                dropped_bindings = result.dropped_bindings,
                duration_ms = result.duration_ms,
                "Initial policy refresh complete"
            );
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Initial policy refresh failed, no policy granted until the next refresh"
            );
        }
    }

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("Policy refresh worker stopped");
                return;
            }
            _ = tokio::time::sleep(interval) => {}
            _ = registry.refresh_requested() => {
                tracing::debug!("Policy refresh requested");
            }
        }

        match run_refresh(&registry, store.as_ref(), roster.as_ref()).await {
            Ok(result) => {
                tracing::debug!(
                    version = result.version,
                    roles = result.roles,
                    bindings = result.bindings,
                    dropped_bindings = result.dropped_bindings,
                    duration_ms = result.duration_ms,
                    "Policy refresh complete"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    version = registry.version(),
                    "Policy refresh failed, keeping existing snapshot"
                );
            }
        }
    }
}
