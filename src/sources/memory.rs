use async_trait::async_trait;
use parking_lot::RwLock;

use super::{GroupRoster, PolicyStore, SourceError};
use crate::models::{LoginProviderGroup, PolicyDocument, RoleBinding, RoleDefinition};

/// In-memory policy document for embedding callers and tests.
///
/// The document can be swapped at any time; the next refresh picks it up.
/// A source can also be marked unavailable, after which every fetch fails
/// until it is marked available again.
#[derive(Debug, Default)]
pub struct StaticPolicySource {
    document: RwLock<PolicyDocument>,
    unavailable: RwLock<Option<String>>,
}

impl StaticPolicySource {
    pub fn new(document: PolicyDocument) -> Self {
        Self {
            document: RwLock::new(document),
            unavailable: RwLock::new(None),
        }
    }

    pub fn set_document(&self, document: PolicyDocument) {
        *self.document.write() = document;
    }

    pub fn set_unavailable(&self, reason: impl Into<String>) {
        *self.unavailable.write() = Some(reason.into());
    }

    pub fn set_available(&self) {
        *self.unavailable.write() = None;
    }

    fn check(&self) -> Result<(), SourceError> {
        match &*self.unavailable.read() {
            Some(reason) => Err(SourceError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PolicyStore for StaticPolicySource {
    async fn fetch_roles(&self) -> Result<Vec<RoleDefinition>, SourceError> {
        self.check()?;
        Ok(self.document.read().roles.clone())
    }

    async fn fetch_role_bindings(&self) -> Result<Vec<RoleBinding>, SourceError> {
        self.check()?;
        Ok(self.document.read().role_bindings.clone())
    }

    async fn fetch_document(&self) -> Result<PolicyDocument, SourceError> {
        self.check()?;
        let document = self.document.read();
        Ok(PolicyDocument {
            roles: document.roles.clone(),
            role_bindings: document.role_bindings.clone(),
            groups: Vec::new(),
        })
    }
}

#[async_trait]
impl GroupRoster for StaticPolicySource {
    async fn fetch_groups(&self) -> Result<Vec<LoginProviderGroup>, SourceError> {
        self.check()?;
        Ok(self.document.read().groups.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_swap_and_availability() {
        let source = StaticPolicySource::default();
        assert!(source.fetch_roles().await.unwrap().is_empty());

        source.set_document(PolicyDocument {
            groups: vec![LoginProviderGroup::new("github", "team-a", ["alice"])],
            ..Default::default()
        });
        assert_eq!(source.fetch_groups().await.unwrap().len(), 1);

        source.set_unavailable("directory offline");
        let err = source.fetch_groups().await.unwrap_err();
        assert_eq!(err.to_string(), "Policy source unavailable: directory offline");

        source.set_available();
        assert!(source.fetch_role_bindings().await.is_ok());
    }
}
