//! Authorization module resolving per-resource action sets.
//!
//! This module implements authorization using:
//! - Roles: ordered permission statements scoped to resource name patterns
//! - Role bindings: external IdP users or groups mapped to a role
//! - Group rosters: IdP-supplied member lists expanding group subjects
//!
//! The resolution flow:
//! 1. Take the currently published [`PolicySnapshot`] once per request
//! 2. Collect bindings with at least one subject matching the principal
//! 3. Collect the bound roles' permissions for the requested resource kind
//! 4. Union the actions of every permission whose includes match the name
//!    and whose excludes do not
//!
//! Grants are additive. There is no deny permission: `excludes` only narrows
//! which names a permission applies to.

mod actions;
mod engine;
mod error;
mod registry;
mod snapshot;
mod subject;

pub use actions::{Action, ResourceKind};
pub use engine::{AuthzEngine, resolve_allowed_actions};
pub use error::PolicyBuildError;
pub use registry::{DecisionCache, PolicyRegistry, PublishError};
pub use snapshot::{BuildReport, Permission, PolicySnapshot, Role};
pub use subject::{Principal, subject_matches};

/// Match a pattern against a resource name.
///
/// Supports three matching modes:
/// - `*` matches any value (full wildcard)
/// - `foo*` matches any value starting with `foo` (prefix wildcard)
/// - `foo` matches only the exact string `foo` (exact match)
///
/// # Examples
///
/// ```
/// use kowl_core::authz::pattern_matches;
///
/// assert!(pattern_matches("*", "anything"));
/// assert!(pattern_matches("orders-*", "orders-2024"));
/// assert!(!pattern_matches("orders-*", "invoices-2024"));
/// assert!(pattern_matches("orders", "orders"));
/// assert!(!pattern_matches("orders", "orders-2024"));
/// ```
pub fn pattern_matches(pattern: &str, value: &str) -> bool {
    if pattern == "*" {
        true
    } else if let Some(prefix) = pattern.strip_suffix('*') {
        value.starts_with(prefix)
    } else {
        pattern == value
    }
}

/// Whether a name is covered by an include list. Absent means every name.
pub fn includes_match(patterns: Option<&[String]>, name: &str) -> bool {
    match patterns {
        None => true,
        Some(patterns) => patterns.iter().any(|p| pattern_matches(p, name)),
    }
}

/// Whether a name is covered by an exclude list. Absent means no name.
pub fn excludes_match(patterns: Option<&[String]>, name: &str) -> bool {
    match patterns {
        None => false,
        Some(patterns) => patterns.iter().any(|p| pattern_matches(p, name)),
    }
}
