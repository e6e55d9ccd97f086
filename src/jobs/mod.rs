//! Background jobs.
//!
//! - **Policy refresh**: periodically rebuilds the policy snapshot from the
//!   configured sources and publishes it, also on demand when
//!   [`PolicyRegistry::request_refresh`](crate::authz::PolicyRegistry::request_refresh)
//!   is called.
//!
//! Jobs follow a consistent pattern: a worker function that loops on the
//! configured interval, a run function that performs a single pass and a
//! structured result type for logging.

mod policy_refresh;

pub use policy_refresh::{RefreshError, RefreshRunResult, run_refresh, start_policy_refresh_worker};
