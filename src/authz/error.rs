//! Policy build errors.

use thiserror::Error;

/// Reasons a policy document cannot become a snapshot.
///
/// Any of these rejects the whole document; the previously published
/// snapshot stays in force.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyBuildError {
    #[error("Role name cannot be empty")]
    EmptyRoleName,

    #[error("Duplicate role name: {0}")]
    DuplicateRole(String),

    #[error("Role '{role}': unknown resource type '{resource}'")]
    UnknownResource { role: String, resource: String },

    #[error("Role '{role}': unknown action '{action}' for resource type '{resource}'")]
    UnknownAction {
        role: String,
        resource: String,
        action: String,
    },
}
