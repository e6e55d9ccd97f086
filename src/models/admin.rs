use serde::{Deserialize, Serialize};

use super::{LoginProviderGroup, RoleBinding, RoleDefinition};

/// A console user together with the roles bound to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    pub name: String,
    pub login_provider: String,
    pub role_names: Vec<String>,
}

/// Everything the admin page shows: users, roles, rosters and bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminInfo {
    pub users: Vec<UserDetails>,
    pub roles: Vec<RoleDefinition>,
    pub groups: Vec<LoginProviderGroup>,
    pub role_bindings: Vec<RoleBinding>,
}
