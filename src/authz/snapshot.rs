//! Immutable policy snapshots.
//!
//! A snapshot is built wholesale from one [`PolicyDocument`]: role
//! definitions are validated against the action vocabulary, bindings to
//! unknown roles are dropped, and group rosters are indexed into member sets
//! so that resolution cost does not depend on group size.

use std::collections::{BTreeSet, HashMap, HashSet};

use super::{
    Action, PolicyBuildError, Principal, ResourceKind, actions::ALL_ACTIONS, excludes_match,
    includes_match, subject_matches,
};
use crate::models::{
    LoginProviderGroup, PermissionDefinition, PolicyDocument, RoleBinding, RoleDefinition,
};

/// A validated permission statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    pub resource: ResourceKind,
    pub includes: Option<Vec<String>>,
    pub excludes: Option<Vec<String>>,
    /// Granted actions with `"all"` and absent lists already expanded.
    pub allowed_actions: BTreeSet<Action>,
}

impl Permission {
    /// Compile a wire permission for the role `role`.
    pub fn compile(role: &str, definition: &PermissionDefinition) -> Result<Self, PolicyBuildError> {
        let resource: ResourceKind =
            definition
                .resource
                .parse()
                .map_err(|_| PolicyBuildError::UnknownResource {
                    role: role.to_string(),
                    resource: definition.resource.clone(),
                })?;

        let allowed_actions = match &definition.allowed_actions {
            None => resource.all_actions(),
            Some(names) => {
                let mut actions = BTreeSet::new();
                for name in names {
                    if name == ALL_ACTIONS {
                        actions.extend(resource.actions().iter().copied());
                        continue;
                    }
                    let action = resource.parse_action(name).ok_or_else(|| {
                        PolicyBuildError::UnknownAction {
                            role: role.to_string(),
                            resource: definition.resource.clone(),
                            action: name.clone(),
                        }
                    })?;
                    actions.insert(action);
                }
                actions
            }
        };

        Ok(Self {
            resource,
            includes: definition.includes.clone(),
            excludes: definition.excludes.clone(),
            allowed_actions,
        })
    }

    /// Whether this permission grants anything on the named resource.
    pub fn applies_to(&self, kind: ResourceKind, name: &str) -> bool {
        self.resource == kind
            && includes_match(self.includes.as_deref(), name)
            && !excludes_match(self.excludes.as_deref(), name)
    }
}

impl From<&Permission> for PermissionDefinition {
    fn from(permission: &Permission) -> Self {
        Self {
            resource: permission.resource.as_str().to_string(),
            includes: permission.includes.clone(),
            excludes: permission.excludes.clone(),
            allowed_actions: Some(
                permission
                    .allowed_actions
                    .iter()
                    .map(|a| a.as_str().to_string())
                    .collect(),
            ),
        }
    }
}

/// A validated role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub name: String,
    pub permissions: Vec<Permission>,
}

impl Role {
    pub fn compile(definition: &RoleDefinition) -> Result<Self, PolicyBuildError> {
        if definition.name.is_empty() {
            return Err(PolicyBuildError::EmptyRoleName);
        }
        let permissions = definition
            .permissions
            .iter()
            .map(|p| Permission::compile(&definition.name, p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: definition.name.clone(),
            permissions,
        })
    }
}

impl From<&Role> for RoleDefinition {
    fn from(role: &Role) -> Self {
        Self {
            name: role.name.clone(),
            permissions: role.permissions.iter().map(Into::into).collect(),
        }
    }
}

/// A roster indexed for O(1) membership checks.
#[derive(Debug, Clone)]
pub(crate) struct GroupMembers {
    definition: LoginProviderGroup,
    members: HashSet<String>,
}

impl GroupMembers {
    fn new(definition: LoginProviderGroup) -> Self {
        let members = definition.user_names.iter().cloned().collect();
        Self {
            definition,
            members,
        }
    }

    fn merge(&mut self, other: LoginProviderGroup) {
        for user in other.user_names {
            if self.members.insert(user.clone()) {
                self.definition.user_names.push(user);
            }
        }
        self.definition
            .member_organizations
            .extend(other.member_organizations);
    }

    pub(crate) fn has_member(&self, user_name: &str) -> bool {
        self.members.contains(user_name)
    }

    pub(crate) fn member_organization(&self, user_name: &str) -> Option<&str> {
        self.definition
            .member_organizations
            .get(user_name)
            .map(String::as_str)
    }
}

/// Counts from a successful build, for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub roles: usize,
    pub bindings: usize,
    pub groups: usize,
    /// Role names referenced by bindings that were dropped
    pub dropped_bindings: Vec<String>,
}

/// Immutable view of roles, bindings and group rosters.
#[derive(Debug, Clone, Default)]
pub struct PolicySnapshot {
    version: u64,
    roles: Vec<Role>,
    role_index: HashMap<String, usize>,
    bindings: Vec<RoleBinding>,
    groups: Vec<GroupMembers>,
    group_index: HashMap<(String, String), usize>,
}

impl PolicySnapshot {
    /// An empty snapshot with version 0. Grants nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from a freshly fetched document.
    ///
    /// Invalid roles reject the whole document. Bindings referencing a role
    /// that does not exist are dropped and reported, not treated as errors.
    /// Rosters listed twice under the same (provider, name) are merged.
    pub fn build(
        document: PolicyDocument,
        version: u64,
    ) -> Result<(Self, BuildReport), PolicyBuildError> {
        let mut roles = Vec::with_capacity(document.roles.len());
        let mut role_index = HashMap::with_capacity(document.roles.len());
        for definition in &document.roles {
            let role = Role::compile(definition)?;
            if role_index.contains_key(&role.name) {
                return Err(PolicyBuildError::DuplicateRole(role.name));
            }
            role_index.insert(role.name.clone(), roles.len());
            roles.push(role);
        }

        let mut bindings = Vec::with_capacity(document.role_bindings.len());
        let mut dropped_bindings = Vec::new();
        for binding in document.role_bindings {
            if role_index.contains_key(&binding.role_name) {
                bindings.push(binding);
            } else {
                tracing::warn!(
                    role = %binding.role_name,
                    subjects = binding.subjects.len(),
                    "Dropping role binding that references an unknown role"
                );
                dropped_bindings.push(binding.role_name);
            }
        }

        let mut groups: Vec<GroupMembers> = Vec::with_capacity(document.groups.len());
        let mut group_index: HashMap<(String, String), usize> =
            HashMap::with_capacity(document.groups.len());
        for group in document.groups {
            let key = (group.provider.clone(), group.name.clone());
            match group_index.get(&key) {
                Some(&idx) => {
                    tracing::debug!(
                        provider = %key.0,
                        group = %key.1,
                        "Merging duplicate group roster"
                    );
                    groups[idx].merge(group);
                }
                None => {
                    group_index.insert(key, groups.len());
                    groups.push(GroupMembers::new(group));
                }
            }
        }

        let report = BuildReport {
            roles: roles.len(),
            bindings: bindings.len(),
            groups: groups.len(),
            dropped_bindings,
        };

        Ok((
            Self {
                version,
                roles,
                role_index,
                bindings,
                groups,
                group_index,
            },
            report,
        ))
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn role(&self, name: &str) -> Option<&Role> {
        self.role_index.get(name).map(|&idx| &self.roles[idx])
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn bindings(&self) -> &[RoleBinding] {
        &self.bindings
    }

    pub(crate) fn group(&self, provider: &str, name: &str) -> Option<&GroupMembers> {
        self.group_index
            .get(&(provider.to_string(), name.to_string()))
            .map(|&idx| &self.groups[idx])
    }

    /// Rosters in the order they were supplied.
    pub fn groups(&self) -> impl Iterator<Item = &LoginProviderGroup> {
        self.groups.iter().map(|g| &g.definition)
    }

    /// Bindings with at least one subject matching the principal.
    pub fn bindings_for<'a>(
        &'a self,
        principal: &'a Principal,
    ) -> impl Iterator<Item = &'a RoleBinding> + 'a {
        self.bindings.iter().filter(move |binding| {
            binding
                .subjects
                .iter()
                .any(|subject| subject_matches(subject, principal, self))
        })
    }

    /// Sorted, de-duplicated names of every role bound to the principal.
    pub fn role_names_for(&self, principal: &Principal) -> Vec<String> {
        let names: BTreeSet<&str> = self
            .bindings_for(principal)
            .map(|binding| binding.role_name.as_str())
            .collect();
        names.into_iter().map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SubjectDefinition;

    fn permission(resource: &str, actions: Option<&[&str]>) -> PermissionDefinition {
        PermissionDefinition {
            resource: resource.to_string(),
            includes: None,
            excludes: None,
            allowed_actions: actions.map(|a| a.iter().map(|s| s.to_string()).collect()),
        }
    }

    fn role(name: &str, permissions: Vec<PermissionDefinition>) -> RoleDefinition {
        RoleDefinition {
            name: name.to_string(),
            permissions,
        }
    }

    #[test]
    fn test_absent_actions_grant_full_vocabulary() {
        let compiled = Permission::compile("r", &permission("topic", None)).unwrap();
        assert_eq!(compiled.allowed_actions, ResourceKind::Topic.all_actions());
    }

    #[test]
    fn test_all_expands_to_kind_vocabulary() {
        let compiled = Permission::compile("r", &permission("group", Some(&["all"]))).unwrap();
        assert_eq!(
            compiled.allowed_actions,
            BTreeSet::from([Action::SeeConsumerGroup])
        );
    }

    #[test]
    fn test_empty_action_list_grants_nothing() {
        let compiled = Permission::compile("r", &permission("topic", Some(&[]))).unwrap();
        assert!(compiled.allowed_actions.is_empty());
    }

    #[test]
    fn test_unknown_action_is_build_error() {
        let err = Permission::compile("r", &permission("topic", Some(&["seeTopic", "deleteTopic"])))
            .unwrap_err();
        assert_eq!(
            err,
            PolicyBuildError::UnknownAction {
                role: "r".to_string(),
                resource: "topic".to_string(),
                action: "deleteTopic".to_string(),
            }
        );
    }

    #[test]
    fn test_action_of_other_kind_is_build_error() {
        let err =
            Permission::compile("r", &permission("group", Some(&["seeTopic"]))).unwrap_err();
        assert!(matches!(err, PolicyBuildError::UnknownAction { .. }));
    }

    #[test]
    fn test_unknown_resource_is_build_error() {
        let err = Permission::compile("r", &permission("cluster", None)).unwrap_err();
        assert_eq!(
            err,
            PolicyBuildError::UnknownResource {
                role: "r".to_string(),
                resource: "cluster".to_string(),
            }
        );
    }

    #[test]
    fn test_duplicate_role_rejects_document() {
        let doc = PolicyDocument {
            roles: vec![role("admin", vec![]), role("admin", vec![])],
            ..Default::default()
        };
        let err = PolicySnapshot::build(doc, 1).unwrap_err();
        assert_eq!(err, PolicyBuildError::DuplicateRole("admin".to_string()));
    }

    #[test]
    fn test_empty_role_name_rejects_document() {
        let doc = PolicyDocument {
            roles: vec![role("", vec![])],
            ..Default::default()
        };
        assert_eq!(
            PolicySnapshot::build(doc, 1).unwrap_err(),
            PolicyBuildError::EmptyRoleName
        );
    }

    #[test]
    fn test_bindings_to_unknown_roles_are_dropped() {
        let doc = PolicyDocument {
            roles: vec![role("viewer", vec![permission("topic", None)])],
            role_bindings: vec![
                RoleBinding::new("viewer", vec![SubjectDefinition::user("github", "alice")]),
                RoleBinding::new("ghost", vec![SubjectDefinition::user("github", "alice")]),
            ],
            groups: vec![],
        };

        let (snapshot, report) = PolicySnapshot::build(doc, 7).unwrap();
        assert_eq!(snapshot.version(), 7);
        assert_eq!(snapshot.bindings().len(), 1);
        assert_eq!(snapshot.bindings()[0].role_name, "viewer");
        assert_eq!(report.bindings, 1);
        assert_eq!(report.dropped_bindings, vec!["ghost".to_string()]);
        assert!(snapshot.role("ghost").is_none());
    }

    #[test]
    fn test_duplicate_rosters_are_merged() {
        let doc = PolicyDocument {
            groups: vec![
                LoginProviderGroup::new("github", "team-a", ["alice", "bob"]),
                LoginProviderGroup::new("github", "team-a", ["bob", "carol"]),
            ],
            ..Default::default()
        };
        let (snapshot, report) = PolicySnapshot::build(doc, 1).unwrap();
        assert_eq!(report.groups, 1);

        let group = snapshot.group("github", "team-a").unwrap();
        assert!(group.has_member("alice"));
        assert!(group.has_member("carol"));
        let roster: Vec<_> = snapshot.groups().collect();
        assert_eq!(roster[0].user_names, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn test_role_names_for_principal() {
        let doc = PolicyDocument {
            roles: vec![role("viewer", vec![]), role("admin", vec![]), role("ops", vec![])],
            role_bindings: vec![
                RoleBinding::new("viewer", vec![SubjectDefinition::group("github", "team-a")]),
                RoleBinding::new("admin", vec![SubjectDefinition::user("github", "bob")]),
                RoleBinding::new("viewer", vec![SubjectDefinition::user("github", "bob")]),
                RoleBinding::new("ops", vec![SubjectDefinition::user("github", "carol")]),
            ],
            groups: vec![LoginProviderGroup::new("github", "team-a", ["bob"])],
        };
        let (snapshot, _) = PolicySnapshot::build(doc, 1).unwrap();

        assert_eq!(
            snapshot.role_names_for(&Principal::new("github", "bob")),
            vec!["admin".to_string(), "viewer".to_string()]
        );
        assert!(snapshot
            .role_names_for(&Principal::new("github", "dave"))
            .is_empty());
    }

    #[test]
    fn test_role_round_trips_to_definition() {
        let definition = role(
            "reader",
            vec![PermissionDefinition {
                resource: "topic".to_string(),
                includes: Some(vec!["orders-*".to_string()]),
                excludes: None,
                allowed_actions: Some(vec!["seeTopic".to_string()]),
            }],
        );
        let compiled = Role::compile(&definition).unwrap();
        assert_eq!(RoleDefinition::from(&compiled), definition);
    }
}
