//! Collaborators that supply the raw catalogs for a policy refresh.
//!
//! A refresh cycle reads roles and role bindings from a [`PolicyStore`] and
//! group rosters from a [`GroupRoster`]. Both are async so that
//! implementations backed by a database or an identity-provider API fit the
//! same seam as the file and in-memory sources shipped here.

mod file;
mod memory;

use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
pub use file::FilePolicySource;
pub use memory::StaticPolicySource;
use thiserror::Error;

use crate::{
    config::PolicySourceConfig,
    models::{LoginProviderGroup, PolicyDocument, RoleBinding, RoleDefinition},
};

/// Errors raised while fetching catalogs.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read policy file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse policy file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Unsupported policy file format for {0} (expected .json or .toml)")]
    UnsupportedFormat(PathBuf),

    #[error("Policy source unavailable: {0}")]
    Unavailable(String),
}

/// Store of role definitions and role bindings.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    async fn fetch_roles(&self) -> Result<Vec<RoleDefinition>, SourceError>;

    async fn fetch_role_bindings(&self) -> Result<Vec<RoleBinding>, SourceError>;

    /// Roles and bindings as of one read of the store. `groups` is left empty.
    ///
    /// The default composes the two fetches above. Stores that can return
    /// both from a single read should override it so that a refresh never
    /// pairs roles from one version of the store with bindings from another.
    async fn fetch_document(&self) -> Result<PolicyDocument, SourceError> {
        let (roles, role_bindings) =
            tokio::try_join!(self.fetch_roles(), self.fetch_role_bindings())?;
        Ok(PolicyDocument {
            roles,
            role_bindings,
            groups: Vec::new(),
        })
    }
}

/// Identity-provider integration reporting group membership.
#[async_trait]
pub trait GroupRoster: Send + Sync {
    async fn fetch_groups(&self) -> Result<Vec<LoginProviderGroup>, SourceError>;
}

/// Build the source named by `[policy.source]`.
///
/// Returns `None` for `type = "none"`; the caller then runs without a refresh
/// worker and the empty snapshot stays published.
pub fn from_config(config: &PolicySourceConfig) -> Result<Option<Arc<FilePolicySource>>, SourceError> {
    match config {
        PolicySourceConfig::None => Ok(None),
        PolicySourceConfig::File { path } => Ok(Some(Arc::new(FilePolicySource::new(path.clone())?))),
    }
}
