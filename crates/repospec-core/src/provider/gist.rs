//! GitHub Gist provider.
//!
//! Specs look like `user/gist-id[/ref]`. The ref is optional; it may be a
//! full revision SHA from the gist's history or `master`. Without a ref, or
//! with `master`, the newest revision is used.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::debug;

use super::{ProviderKind, RepoProvider, checked_sha};
use crate::config::{GistSettings, GitHubSettings};
use crate::error::{ProviderError, Result};
use crate::github::{ApiResponse, GitHubApi};
use crate::spec::GistSpec;

#[derive(Debug)]
pub struct GistProvider {
    spec: String,
    parsed: GistSpec,
    github: GitHubSettings,
    api_base: String,
    allow_secret_gist: bool,
    api: GitHubApi,
    resolved: OnceCell<Option<String>>,
}

impl GistProvider {
    /// # Errors
    ///
    /// Returns a validation error if the spec has no gist id.
    pub fn new(
        spec: impl Into<String>,
        settings: &GistSettings,
        github: &GitHubSettings,
        api: GitHubApi,
    ) -> Result<Self> {
        let spec = spec.into();
        let parsed = GistSpec::parse(&spec)?;
        Ok(Self {
            spec,
            parsed,
            github: github.clone(),
            api_base: settings.api_url(github),
            allow_secret_gist: settings.allow_secret_gist,
            api,
            resolved: OnceCell::new(),
        })
    }

    pub fn gist_id(&self) -> &str {
        &self.parsed.gist_id
    }

    pub fn api_url(&self) -> String {
        format!("{}/gists/{}", self.api_base, self.parsed.gist_id)
    }

    async fn fetch(&self) -> Result<Option<String>> {
        let api_url = self.api_url();
        debug!(url = %api_url, "Fetching");

        let ref_info = match self.api.request(&api_url, None).await? {
            ApiResponse::Fresh { body, .. } => body,
            ApiResponse::NotFound => return Ok(None),
            ApiResponse::NotModified => {
                return Err(ProviderError::InvalidResponse(format!(
                    "{api_url} returned 304 for an unconditional request"
                )));
            }
        };

        let public = ref_info
            .get("public")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !public && !self.allow_secret_gist {
            return Err(ProviderError::Permission(
                "You seem to want to use a secret Gist, but do not have permission to do so. \
                 To enable secret Gist support, set (or have an administrator set) \
                 'gist.allow_secret_gist = true'"
                    .to_string(),
            ));
        }

        let versions = history_versions(&ref_info);
        let selected = if self.parsed.wants_latest() {
            versions.first().copied()
        } else {
            versions
                .iter()
                .copied()
                .find(|version| *version == self.parsed.unresolved_ref)
        };

        selected
            .map(|version| checked_sha(version, &api_url))
            .transpose()
    }
}

/// Revision ids of a gist, newest first.
fn history_versions(ref_info: &Value) -> Vec<&str> {
    ref_info
        .get("history")
        .and_then(Value::as_array)
        .map(|history| {
            history
                .iter()
                .filter_map(|entry| entry.get("version").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl RepoProvider for GistProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gist
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
            "https://gist.github.com/{}/{}.git",
            self.parsed.user, self.parsed.gist_id
        )
    }

    fn build_slug(&self) -> Result<String> {
        Ok(self.parsed.gist_id.clone())
    }

    fn git_credentials(&self) -> String {
        self.github.git_credentials()
    }
}
