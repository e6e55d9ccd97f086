use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{GroupRoster, PolicyStore, SourceError};
use crate::models::{LoginProviderGroup, PolicyDocument, RoleBinding, RoleDefinition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentFormat {
    Json,
    Toml,
}

/// Policy document on disk.
///
/// The file is re-read on every fetch so edits take effect on the next
/// refresh cycle. `.json` files use the console's JSON shape, `.toml` files
/// the same field names in TOML.
#[derive(Debug, Clone)]
pub struct FilePolicySource {
    path: PathBuf,
    format: DocumentFormat,
}

impl FilePolicySource {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let path = path.into();
        let format = match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            Some(ext) if ext.eq_ignore_ascii_case("toml") => DocumentFormat::Toml,
            _ => return Err(SourceError::UnsupportedFormat(path)),
        };
        Ok(Self { path, format })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the whole document.
    pub async fn load(&self) -> Result<PolicyDocument, SourceError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })?;

        let parsed: Result<PolicyDocument, String> = match self.format {
            DocumentFormat::Json => serde_json::from_str(&contents).map_err(|e| e.to_string()),
            DocumentFormat::Toml => toml::from_str(&contents).map_err(|e| e.to_string()),
        };

        let document = parsed.map_err(|message| SourceError::Parse {
            path: self.path.clone(),
            message,
        })?;

        tracing::debug!(
            path = %self.path.display(),
            roles = document.roles.len(),
            role_bindings = document.role_bindings.len(),
            groups = document.groups.len(),
            "Loaded policy file"
        );
        Ok(document)
    }
}

#[async_trait]
impl PolicyStore for FilePolicySource {
    async fn fetch_roles(&self) -> Result<Vec<RoleDefinition>, SourceError> {
        Ok(self.load().await?.roles)
    }

    async fn fetch_role_bindings(&self) -> Result<Vec<RoleBinding>, SourceError> {
        Ok(self.load().await?.role_bindings)
    }

    async fn fetch_document(&self) -> Result<PolicyDocument, SourceError> {
        let document = self.load().await?;
        Ok(PolicyDocument {
            groups: Vec::new(),
            ..document
        })
    }
}

#[async_trait]
impl GroupRoster for FilePolicySource {
    async fn fetch_groups(&self) -> Result<Vec<LoginProviderGroup>, SourceError> {
        Ok(self.load().await?.groups)
    }
}
