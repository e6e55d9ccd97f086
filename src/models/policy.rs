use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Wire form of a permission statement inside a role.
///
/// Actions and the resource type are plain strings here; they are checked
/// against the closed vocabulary when a snapshot is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionDefinition {
    /// Resource type tag (e.g. "topic", "group")
    pub resource: String,
    /// Name patterns the grant applies to. Absent means every name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub includes: Option<Vec<String>>,
    /// Name patterns removed from the grant. Absent means none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excludes: Option<Vec<String>>,
    /// Granted actions. Absent means every action of the resource type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_actions: Option<Vec<String>>,
}

/// Wire form of a role: a named, ordered list of permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDefinition {
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<PermissionDefinition>,
}

/// Whether a subject names a single user or a group of users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    User,
    Group,
}

/// A user or group at an external identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectDefinition {
    pub kind: SubjectKind,
    /// Login provider (e.g. "github", "google")
    pub provider: String,
    /// Login name of the user, or name of the group
    pub name: String,
    /// Organization scope for provider-specific teams (GitHub teams)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
}

impl SubjectDefinition {
    pub fn user(provider: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: SubjectKind::User,
            provider: provider.into(),
            name: name.into(),
            organization: None,
        }
    }

    pub fn group(provider: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: SubjectKind::Group,
            provider: provider.into(),
            name: name.into(),
            organization: None,
        }
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }
}

/// Links subjects to exactly one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleBinding {
    pub role_name: String,
    #[serde(default)]
    pub subjects: Vec<SubjectDefinition>,
    /// Opaque metadata attached by the policy store (carried through untouched)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl RoleBinding {
    pub fn new(role_name: impl Into<String>, subjects: Vec<SubjectDefinition>) -> Self {
        Self {
            role_name: role_name.into(),
            subjects,
            metadata: serde_json::Map::new(),
        }
    }
}

/// Group roster supplied by an identity-provider integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginProviderGroup {
    pub provider: String,
    pub name: String,
    #[serde(default)]
    pub user_names: Vec<String>,
    /// Organization tag per member, when the integration reports one.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub member_organizations: HashMap<String, String>,
}

impl LoginProviderGroup {
    pub fn new<I, S>(provider: impl Into<String>, name: impl Into<String>, user_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            provider: provider.into(),
            name: name.into(),
            user_names: user_names.into_iter().map(Into::into).collect(),
            member_organizations: HashMap::new(),
        }
    }

    pub fn with_member_organization(
        mut self,
        user_name: impl Into<String>,
        organization: impl Into<String>,
    ) -> Self {
        self.member_organizations
            .insert(user_name.into(), organization.into());
        self
    }
}

/// Raw catalogs fetched by one refresh cycle, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDocument {
    #[serde(default)]
    pub roles: Vec<RoleDefinition>,
    #[serde(default)]
    pub role_bindings: Vec<RoleBinding>,
    #[serde(default)]
    pub groups: Vec<LoginProviderGroup>,
}
