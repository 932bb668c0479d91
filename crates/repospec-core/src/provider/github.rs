//! GitHub provider.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::{ProviderKind, RepoProvider, checked_sha};
use crate::cache::{CacheEntry, RefCache};
use crate::config::GitHubSettings;
use crate::error::{ProviderError, Result};
use crate::github::{ApiResponse, GitHubApi};
use crate::spec::GitHubSpec;

/// Provider for `user/repo/ref` specs on GitHub or GitHub Enterprise.
///
/// Resolutions go through a cache shared with every other GitHub provider,
/// so repeated lookups of a ref become conditional requests that do not
/// count against the rate limit when nothing changed.
#[derive(Debug)]
pub struct GitHubProvider {
    spec: String,
    parsed: GitHubSpec,
    settings: GitHubSettings,
    api: GitHubApi,
    cache: Arc<RefCache>,
    resolved: OnceCell<Option<String>>,
}

impl GitHubProvider {
    /// # Errors
    ///
    /// Returns a validation error unless the spec is `user/repo/ref`.
    pub fn new(
        spec: impl Into<String>,
        settings: &GitHubSettings,
        api: GitHubApi,
        cache: Arc<RefCache>,
    ) -> Result<Self> {
        let spec = spec.into();
        let parsed = GitHubSpec::parse(&spec)?;
        Ok(Self {
            spec,
            parsed,
            settings: settings.clone(),
            api,
            cache,
            resolved: OnceCell::new(),
        })
    }

    pub fn user(&self) -> &str {
        &self.parsed.user
    }

    pub fn repo(&self) -> &str {
        &self.parsed.repo
    }

    /// Commits API URL for the unresolved ref; also the cache key.
    pub fn api_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/commits/{}",
            self.settings.api_url(),
            self.parsed.user,
            self.parsed.repo,
            self.parsed.unresolved_ref
        )
    }

    async fn fetch(&self) -> Result<Option<String>> {
        let api_url = self.api_url();
        debug!(url = %api_url, "Fetching");

        let cached = self.cache.get(&api_url);
        let etag = cached.as_ref().and_then(|entry| entry.etag.as_deref());
        if let Some(etag) = etag {
            debug!(url = %api_url, etag, "Cache hit");
        }

        match self.api.request(&api_url, etag).await? {
            ApiResponse::NotFound => Ok(None),
            ApiResponse::NotModified => {
                let Some(cached) = cached else {
                    return Err(ProviderError::InvalidResponse(format!(
                        "{api_url} returned 304 for an unconditional request"
                    )));
                };
                info!(url = %api_url, sha = %cached.sha, "Using cached ref");
                self.cache.touch(&api_url);
                Ok(Some(cached.sha))
            }
            ApiResponse::Fresh { etag, body } => {
                if cached.is_some() {
                    debug!(url = %api_url, "Cache outdated");
                }
                let Some(sha) = body.get("sha").and_then(Value::as_str) else {
                    warn!(url = %api_url, response = %body, "No sha in response");
                    return Ok(None);
                };
                let sha = checked_sha(sha, &api_url)?;
                self.cache.set(
                    api_url,
                    CacheEntry {
                        etag,
                        sha: sha.clone(),
                    },
                );
                Ok(Some(sha))
            }
        }
    }
}

#[async_trait]
impl RepoProvider for GitHubProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GitHub
    }

    fn spec(&self) -> &str {
        &self.spec
    }

    fn unresolved_ref(&self) -> &str {
        &self.parsed.unresolved_ref
    }

    async fn resolve_ref(&self) -> Result<Option<String>> {
        self.resolved
            .get_or_try_init(|| self.fetch())
            .await
            .cloned()
    }

    fn repo_url(&self) -> String {
        format!(
            "https://{}/{}/{}",
            self.settings.hostname, self.parsed.user, self.parsed.repo
        )
    }

    fn build_slug(&self) -> Result<String> {
        Ok(format!("{}-{}", self.parsed.user, self.parsed.repo))
    }

    fn git_credentials(&self) -> String {
        self.settings.git_credentials()
    }
}
