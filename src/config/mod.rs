//! Configuration for the authorization and lag core.
//!
//! Loaded from TOML, with support for environment variable interpolation
//! using `${VAR_NAME}` syntax.
//!
//! # Example
//!
//! ```toml
//! [policy]
//! refresh_interval_secs = 30
//!
//! [policy.source]
//! type = "file"
//! path = "${KOWL_CONFIG_DIR}/policy.json"
//!
//! [observability.logging]
//! level = "debug"
//! format = "json"
//! ```

mod observability;
mod policy;

use std::path::Path;

pub use observability::*;
pub use policy::*;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Root configuration. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoreConfig {
    /// Policy source, refresh cadence and decision caching.
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Logging and metrics.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl CoreConfig {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables in the format `${VAR_NAME}` are expanded.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(contents)?;
        let config: CoreConfig = toml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.policy.refresh_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "policy.refresh_interval_secs must be greater than zero".into(),
            ));
        }

        if let PolicySourceConfig::File { path } = &self.policy.source
            && path.as_os_str().is_empty()
        {
            return Err(ConfigError::Validation(
                "policy.source.path cannot be empty".into(),
            ));
        }

        for bucket in &self.observability.metrics.refresh_buckets_secs {
            if !bucket.is_finite() || *bucket <= 0.0 {
                return Err(ConfigError::Validation(format!(
                    "observability.metrics.refresh_buckets_secs contains invalid bucket {bucket}"
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {1}: {0}")]
    Io(std::io::Error, std::path::PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

/// Expand `${VAR}` references, leaving anything after a `#` untouched.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConfigError::Validation(e.to_string()))?;

    let mut lines = Vec::new();
    for line in input.split('\n') {
        let (code, comment) = match line.find('#') {
            Some(pos) => line.split_at(pos),
            None => (line, ""),
        };

        let mut expanded = String::with_capacity(line.len());
        let mut last_end = 0;
        for cap in re.captures_iter(code) {
            let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            expanded.push_str(&code[last_end..whole.start()]);
            let value = std::env::var(name.as_str())
                .map_err(|_| ConfigError::EnvVarNotFound(name.as_str().to_string()))?;
            expanded.push_str(&value);
            last_end = whole.end();
        }
        expanded.push_str(&code[last_end..]);
        expanded.push_str(comment);
        lines.push(expanded);
    }

    Ok(lines.join("\n"))
}
