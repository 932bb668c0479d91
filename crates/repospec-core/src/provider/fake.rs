//! Fake provider for exercising the UI without network access.

use async_trait::async_trait;

use super::{ProviderKind, RepoProvider};
use crate::error::Result;

/// Resolved ref returned for every spec.
pub const FAKE_RESOLVED_REF: &str = "1a2b3c4d5e6f1a2b3c4d5e6f1a2b3c4d5e6f1a2b";

#[derive(Debug, Clone)]
pub struct FakeProvider {
    spec: String,
}

impl FakeProvider {
    /// Any spec is accepted.
    pub fn new(spec: impl Into<String>) -> Self {
        Self { spec: spec.into() }
    }
}

#[async_trait]
impl RepoProvider for FakeProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Fake
    }

    fn spec(&self) -> &str {
        &self.spec
    }

    fn unresolved_ref(&self) -> &str {
        ""
    }

    async fn resolve_ref(&self) -> Result<Option<String>> {
        Ok(Some(FAKE_RESOLVED_REF.to_string()))
    }

    fn repo_url(&self) -> String {
        "https://example.com/fake/repo.git".to_string()
    }

    fn build_slug(&self) -> Result<String> {
        Ok(format!("{}-{}", "Rick", "Morty"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn canned_values() {
        let provider = FakeProvider::new("anything");
        assert_eq!(provider.name(), "Fake");
        assert_eq!(
            provider.resolve_ref().await.unwrap().as_deref(),
            Some(FAKE_RESOLVED_REF)
        );
        assert_eq!(provider.repo_url(), "https://example.com/fake/repo.git");
        assert_eq!(provider.build_slug().unwrap(), "Rick-Morty");
        assert_eq!(provider.git_credentials(), "");
    }
}
