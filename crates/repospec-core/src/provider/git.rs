//! Bare git provider for repositories on hosts without an API.
//!
//! The spec already pins a commit, so nothing needs resolving:
//!
//! ```text
//! https%3A%2F%2Fgithub.com%2Fjupyterhub%2Fzero-to-jupyterhub-k8s/f7f3ff6d1bf708bdc12e5f10e18b2a90a4795603
//! ```

use async_trait::async_trait;

use super::{ProviderKind, RepoProvider};
use crate::error::Result;
use crate::spec::GitSpec;

#[derive(Debug, Clone)]
pub struct GitProvider {
    spec: String,
    parsed: GitSpec,
}

impl GitProvider {
    /// # Errors
    ///
    /// Returns a validation error unless the spec ends in a full SHA-1.
    pub fn new(spec: impl Into<String>) -> Result<Self> {
        let spec = spec.into();
        let parsed = GitSpec::parse(&spec)?;
        Ok(Self { spec, parsed })
    }
}

#[async_trait]
impl RepoProvider for GitProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Git
    }

    fn spec(&self) -> &str {
        &self.spec
    }

    fn unresolved_ref(&self) -> &str {
        &self.parsed.resolved_ref
    }

    async fn resolve_ref(&self) -> Result<Option<String>> {
        Ok(Some(self.parsed.resolved_ref.clone()))
    }

    fn repo_url(&self) -> String {
        self.parsed.repo.clone()
    }

    fn build_slug(&self) -> Result<String> {
        Ok(self.parsed.repo.clone())
    }
}
