//! Permission resolution.

use std::{collections::BTreeSet, sync::Arc};

use super::{Action, PolicyRegistry, PolicySnapshot, Principal, ResourceKind};
use crate::{config::PolicyConfig, observability::metrics};

/// Resolve the actions a principal may perform on one resource.
///
/// Unions the allowed actions of every permission, reachable through a
/// binding with a subject matching the principal, whose resource kind is
/// `kind` and whose include/exclude patterns admit `name`. The result is a
/// pure function of its arguments. An empty set means nothing is granted.
pub fn resolve_allowed_actions(
    principal: &Principal,
    kind: ResourceKind,
    name: &str,
    snapshot: &PolicySnapshot,
) -> BTreeSet<Action> {
    let mut allowed = BTreeSet::new();

    for binding in snapshot.bindings_for(principal) {
        let Some(role) = snapshot.role(&binding.role_name) else {
            continue;
        };
        for permission in &role.permissions {
            if permission.applies_to(kind, name) {
                allowed.extend(permission.allowed_actions.iter().copied());
            }
        }
    }

    allowed
}

/// Authorization engine bound to a [`PolicyRegistry`].
///
/// Callers take one snapshot per request with [`AuthzEngine::snapshot`] and
/// pass it to every resolution in that request, so a refresh publishing
/// mid-request never mixes old and new policy.
#[derive(Clone)]
pub struct AuthzEngine {
    registry: Arc<PolicyRegistry>,
    memoize: bool,
}

impl AuthzEngine {
    pub fn new(registry: Arc<PolicyRegistry>, memoize: bool) -> Self {
        Self { registry, memoize }
    }

    /// Engine over a fresh registry sized from `[policy]`.
    pub fn from_config(config: &PolicyConfig) -> Self {
        Self::new(
            Arc::new(PolicyRegistry::new(config.max_cached_decisions)),
            config.memoize_decisions,
        )
    }

    pub fn registry(&self) -> &Arc<PolicyRegistry> {
        &self.registry
    }

    /// The currently published snapshot.
    pub fn snapshot(&self) -> Arc<PolicySnapshot> {
        self.registry.current()
    }

    /// Resolve allowed actions under `snapshot`, memoized per snapshot version.
    pub fn allowed_actions(
        &self,
        snapshot: &PolicySnapshot,
        principal: &Principal,
        kind: ResourceKind,
        name: &str,
    ) -> Arc<BTreeSet<Action>> {
        if !self.memoize {
            return Arc::new(resolve_allowed_actions(principal, kind, name, snapshot));
        }

        let cache = self.registry.decision_cache();
        if let Some(hit) = cache.get(snapshot.version(), principal, kind, name) {
            metrics::record_decision_cache(true);
            return hit;
        }
        metrics::record_decision_cache(false);

        let resolved = Arc::new(resolve_allowed_actions(principal, kind, name, snapshot));
        cache.insert(snapshot.version(), principal, kind, name, Arc::clone(&resolved));
        resolved
    }

    /// Check a single action.
    pub fn is_allowed(
        &self,
        snapshot: &PolicySnapshot,
        principal: &Principal,
        kind: ResourceKind,
        name: &str,
        action: Action,
    ) -> bool {
        let allowed = self.allowed_actions(snapshot, principal, kind, name);
        tracing::trace!(
            provider = %principal.provider,
            login = %principal.login_name,
            resource = %kind,
            name = %name,
            action = %action,
            snapshot_version = snapshot.version(),
            allowed = allowed.contains(&action),
            "Authorization check"
        );
        allowed.contains(&action)
    }
}
