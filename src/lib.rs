//! Core engine of the Kafka administration console.
//!
//! Two independent subsystems live here:
//!
//! - [`authz`]: resolves the set of actions an externally authenticated
//!   principal may perform on a topic or consumer group, from roles, role
//!   bindings and identity-provider group rosters held in an immutable
//!   [`authz::PolicySnapshot`].
//! - [`lag`]: merges per-partition committed offsets and high watermarks into
//!   per-topic and per-group lag summaries.
//!
//! [`listing`] composes both at the response-assembly boundary. Policy data is
//! fetched by [`sources`] and republished periodically by [`jobs`].

pub mod authz;
pub mod config;
pub mod jobs;
pub mod lag;
pub mod listing;
pub mod models;
pub mod observability;
pub mod sources;

pub use authz::{Action, AuthzEngine, PolicyRegistry, PolicySnapshot, Principal, ResourceKind};
pub use config::{ConfigError, CoreConfig};
