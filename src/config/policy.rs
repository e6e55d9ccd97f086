use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Policy refresh and decision caching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    /// Seconds between scheduled refresh cycles. Must be greater than zero.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// Memoize resolved actions per snapshot version.
    #[serde(default = "default_true")]
    pub memoize_decisions: bool,

    /// Upper bound on memoized decisions (0 = unlimited).
    #[serde(default = "default_max_cached_decisions")]
    pub max_cached_decisions: usize,

    /// Where roles, bindings and group rosters come from.
    #[serde(default)]
    pub source: PolicySourceConfig,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
            memoize_decisions: true,
            max_cached_decisions: default_max_cached_decisions(),
            source: PolicySourceConfig::default(),
        }
    }
}

fn default_refresh_interval_secs() -> u64 {
    60
}

fn default_max_cached_decisions() -> usize {
    10_000
}

fn default_true() -> bool {
    true
}

/// Policy source selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PolicySourceConfig {
    /// No source configured; only the empty snapshot is ever published.
    #[default]
    None,

    /// A JSON or TOML policy document on disk, chosen by file extension.
    File { path: PathBuf },
}

impl PolicyConfig {
    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.refresh_interval_secs)
    }
}
