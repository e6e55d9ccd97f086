//! Logging and metrics.
//!
//! - Structured logging with configurable formats (pretty, compact, JSON),
//!   available with the `logging` feature
//! - Prometheus metrics for policy refreshes and decision caching, recorded
//!   with the `prometheus` feature and no-ops otherwise

pub mod metrics;
#[cfg(feature = "logging")]
mod tracing_init;

#[cfg(feature = "logging")]
pub use tracing_init::*;
