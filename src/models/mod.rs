//! Data contracts exchanged with the console's presentation layer and with
//! the collaborators that feed the engine.
//!
//! Field names serialize in camelCase to match the REST shapes the frontend
//! consumes.

mod admin;
mod cluster;
mod lag;
mod policy;

pub use admin::*;
pub use cluster::*;
pub use lag::*;
pub use policy::*;
