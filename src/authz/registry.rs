//! Published policy snapshot and per-snapshot decision cache.
//!
//! The registry holds exactly one published [`PolicySnapshot`]. Readers clone
//! the `Arc` once per request and keep using it even if a refresh publishes a
//! replacement meanwhile, so a request never observes a mix of old and new
//! policy. Publishing swaps the pointer under a short write lock and discards
//! every memoized decision.

use std::{collections::BTreeSet, sync::Arc};

use dashmap::DashMap;
use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::Notify;

use super::{Action, PolicySnapshot, Principal, ResourceKind};

/// Errors that can occur when publishing a snapshot.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PublishError {
    #[error("Snapshot version {offered} is not newer than published version {current}")]
    StaleVersion { offered: u64, current: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DecisionKey {
    provider: String,
    login_name: String,
    kind: ResourceKind,
    name: String,
    version: u64,
}

impl DecisionKey {
    fn new(version: u64, principal: &Principal, kind: ResourceKind, name: &str) -> Self {
        Self {
            provider: principal.provider.clone(),
            login_name: principal.login_name.clone(),
            kind,
            name: name.to_string(),
            version,
        }
    }
}

/// Memoized resolution results keyed by principal, resource and snapshot version.
pub struct DecisionCache {
    entries: DashMap<DecisionKey, Arc<BTreeSet<Action>>>,
    /// Maximum entries before the cache is cleared (0 = unlimited)
    max_entries: usize,
}

impl DecisionCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries,
        }
    }

    pub fn get(
        &self,
        version: u64,
        principal: &Principal,
        kind: ResourceKind,
        name: &str,
    ) -> Option<Arc<BTreeSet<Action>>> {
        self.entries
            .get(&DecisionKey::new(version, principal, kind, name))
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn insert(
        &self,
        version: u64,
        principal: &Principal,
        kind: ResourceKind,
        name: &str,
        actions: Arc<BTreeSet<Action>>,
    ) {
        if self.max_entries > 0 && self.entries.len() >= self.max_entries {
            tracing::debug!(
                entries = self.entries.len(),
                max = self.max_entries,
                "Decision cache full, clearing"
            );
            self.entries.clear();
        }
        self.entries
            .insert(DecisionKey::new(version, principal, kind, name), actions);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Holder of the currently published policy snapshot.
pub struct PolicyRegistry {
    current: RwLock<Arc<PolicySnapshot>>,
    decisions: DecisionCache,
    refresh: Notify,
}

impl PolicyRegistry {
    /// Create a registry publishing an empty snapshot (version 0).
    ///
    /// `max_cached_decisions` bounds the decision cache (0 = unlimited).
    pub fn new(max_cached_decisions: usize) -> Self {
        Self {
            current: RwLock::new(Arc::new(PolicySnapshot::empty())),
            decisions: DecisionCache::new(max_cached_decisions),
            refresh: Notify::new(),
        }
    }

    /// The published snapshot. Hold on to it for the whole request.
    pub fn current(&self) -> Arc<PolicySnapshot> {
        self.current.read().clone()
    }

    pub fn version(&self) -> u64 {
        self.current.read().version()
    }

    /// Version to use for the next snapshot built by a refresh.
    pub fn next_version(&self) -> u64 {
        self.version() + 1
    }

    /// Atomically replace the published snapshot.
    ///
    /// The offered snapshot must be newer than the published one so that a
    /// slow refresh cannot overwrite the result of a later one.
    pub fn publish(&self, snapshot: PolicySnapshot) -> Result<(), PublishError> {
        let offered = snapshot.version();
        {
            let mut current = self.current.write();
            if offered <= current.version() {
                return Err(PublishError::StaleVersion {
                    offered,
                    current: current.version(),
                });
            }
            *current = Arc::new(snapshot);
        }
        self.decisions.clear();

        tracing::info!(version = offered, "Published policy snapshot");
        Ok(())
    }

    pub fn decision_cache(&self) -> &DecisionCache {
        &self.decisions
    }

    /// Ask the refresh worker to run a cycle now (external change notification).
    pub fn request_refresh(&self) {
        self.refresh.notify_one();
    }

    /// Resolves once a refresh has been requested.
    pub async fn refresh_requested(&self) {
        self.refresh.notified().await;
    }
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::Barrier,
        thread,
        time::Duration,
    };

    use super::*;
    use crate::{
        authz::resolve_allowed_actions,
        models::{PermissionDefinition, PolicyDocument, RoleBinding, RoleDefinition, SubjectDefinition},
    };

    /// Grants `action` on every topic to alice and bob through one binding each.
    fn snapshot_granting(action: &str, version: u64) -> PolicySnapshot {
        let doc = PolicyDocument {
            roles: vec![RoleDefinition {
                name: "r".to_string(),
                permissions: vec![PermissionDefinition {
                    resource: "topic".to_string(),
                    includes: None,
                    excludes: None,
                    allowed_actions: Some(vec![action.to_string()]),
                }],
            }],
            role_bindings: vec![
                RoleBinding::new("r", vec![SubjectDefinition::user("github", "alice")]),
                RoleBinding::new("r", vec![SubjectDefinition::user("github", "bob")]),
            ],
            groups: vec![],
        };
        PolicySnapshot::build(doc, version).unwrap().0
    }

    #[test]
    fn test_starts_with_empty_snapshot() {
        let registry = PolicyRegistry::default();
        assert_eq!(registry.version(), 0);
        assert_eq!(registry.next_version(), 1);
        assert!(registry.current().bindings().is_empty());
    }

    #[test]
    fn test_publish_rejects_stale_version() {
        let registry = PolicyRegistry::default();
        registry.publish(snapshot_granting("seeTopic", 2)).unwrap();

        let err = registry.publish(snapshot_granting("viewConfig", 2)).unwrap_err();
        assert_eq!(err, PublishError::StaleVersion { offered: 2, current: 2 });
        assert_eq!(registry.version(), 2);
    }

    #[test]
    fn test_held_snapshot_survives_publish() {
        let registry = PolicyRegistry::default();
        registry.publish(snapshot_granting("seeTopic", 1)).unwrap();

        let held = registry.current();
        registry.publish(snapshot_granting("viewConfig", 2)).unwrap();

        let alice = Principal::new("github", "alice");
        assert_eq!(held.version(), 1);
        assert_eq!(
            resolve_allowed_actions(&alice, ResourceKind::Topic, "t", &held),
            BTreeSet::from([Action::SeeTopic])
        );
        assert_eq!(
            resolve_allowed_actions(&alice, ResourceKind::Topic, "t", &registry.current()),
            BTreeSet::from([Action::ViewConfig])
        );
    }

    /// Resolve for two principals under one snapshot and return its version.
    fn resolve_both(
        snapshot: &PolicySnapshot,
        old: &BTreeSet<Action>,
        new: &BTreeSet<Action>,
    ) -> u64 {
        let a = resolve_allowed_actions(
            &Principal::new("github", "alice"),
            ResourceKind::Topic,
            "t",
            snapshot,
        );
        let b = resolve_allowed_actions(
            &Principal::new("github", "bob"),
            ResourceKind::Topic,
            "t",
            snapshot,
        );
        // Both calls in one request agree with one snapshot
        let expected = if snapshot.version() == 1 { old } else { new };
        assert_eq!(&a, expected);
        assert_eq!(&b, expected);
        snapshot.version()
    }

    #[test]
    fn test_concurrent_readers_see_whole_snapshots() {
        let registry = Arc::new(PolicyRegistry::default());
        registry.publish(snapshot_granting("seeTopic", 1)).unwrap();

        let old = BTreeSet::from([Action::SeeTopic]);
        let new = BTreeSet::from([Action::ViewMessages]);
        // Readers plus the publishing thread
        let ready = Arc::new(Barrier::new(5));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let ready = Arc::clone(&ready);
                let (old, new) = (old.clone(), new.clone());
                thread::spawn(move || {
                    let mut seen = BTreeSet::new();
                    seen.insert(resolve_both(&registry.current(), &old, &new));
                    ready.wait();
                    // Keep resolving until the publish lands
                    loop {
                        let version = resolve_both(&registry.current(), &old, &new);
                        seen.insert(version);
                        if version == 2 {
                            break;
                        }
                    }
                    seen
                })
            })
            .collect();

        ready.wait();
        registry.publish(snapshot_granting("viewMessages", 2)).unwrap();

        for reader in readers {
            assert_eq!(reader.join().unwrap(), BTreeSet::from([1, 2]));
        }
        assert_eq!(registry.version(), 2);
    }

    #[test]
    fn test_decision_cache_bound() {
        let cache = DecisionCache::new(2);
        let alice = Principal::new("github", "alice");
        let empty = Arc::new(BTreeSet::new());

        cache.insert(1, &alice, ResourceKind::Topic, "a", Arc::clone(&empty));
        cache.insert(1, &alice, ResourceKind::Topic, "b", Arc::clone(&empty));
        assert_eq!(cache.len(), 2);

        cache.insert(1, &alice, ResourceKind::Topic, "c", Arc::clone(&empty));
        assert_eq!(cache.len(), 1);
        assert!(cache.get(1, &alice, ResourceKind::Topic, "c").is_some());
        assert!(cache.get(2, &alice, ResourceKind::Topic, "c").is_none());
    }

    #[tokio::test]
    async fn test_refresh_request_is_remembered() {
        let registry = PolicyRegistry::default();
        registry.request_refresh();
        // A request made before anyone waits still wakes the next waiter
        tokio::time::timeout(Duration::from_secs(1), registry.refresh_requested())
            .await
            .unwrap();
    }
}
