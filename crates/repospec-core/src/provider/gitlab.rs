//! GitLab provider.
//!
//! GitLab allows nested namespaces (`group/subgroup/repo`), so the namespace
//! is url-escaped in the spec:
//!
//! ```text
//! group%2Fproject%2Frepo/master
//! ```

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::debug;

use super::{ProviderKind, RepoProvider, checked_sha};
use crate::config::GitLabSettings;
use crate::error::{ProviderError, Result};
use crate::http;
use crate::spec::{GitLabSpec, quote};

#[derive(Debug)]
pub struct GitLabProvider {
    spec: String,
    parsed: GitLabSpec,
    settings: GitLabSettings,
    client: reqwest::Client,
    resolved: OnceCell<Option<String>>,
}

impl GitLabProvider {
    /// # Errors
    ///
    /// Returns a validation error if the spec has no ref.
    pub fn new(
        spec: impl Into<String>,
        settings: &GitLabSettings,
        client: reqwest::Client,
    ) -> Result<Self> {
        let spec = spec.into();
        let parsed = GitLabSpec::parse(&spec)?;
        Ok(Self {
            spec,
            parsed,
            settings: settings.clone(),
            client,
            resolved: OnceCell::new(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.parsed.namespace
    }

    /// Commits API URL for the unresolved ref, without credentials.
    pub fn api_url(&self) -> String {
        format!(
            "{}/projects/{}/repository/commits/{}",
            self.settings.api_url(),
            quote(&self.parsed.namespace),
            quote(&self.parsed.unresolved_ref),
        )
    }

    async fn fetch(&self) -> Result<Option<String>> {
        let api_url = self.api_url();
        debug!(url = %api_url, "Fetching");

        let url = http::with_query(&api_url, &self.settings.auth())?;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ProviderError::HttpStatus {
                status: status.as_u16(),
                url: api_url,
            });
        }

        let ref_info = response.json::<Value>().await?;
        let id = ref_info
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ProviderError::InvalidResponse(format!("No commit id in response from {api_url}"))
            })?;
        checked_sha(id, &api_url).map(Some)
    }
}

#[async_trait]
impl RepoProvider for GitLabProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GitLab
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
            "https://{}/{}.git",
            self.settings.hostname, self.parsed.namespace
        )
    }

    fn build_slug(&self) -> Result<String> {
        Ok(self.parsed.build_slug())
    }

    fn git_credentials(&self) -> String {
        self.settings.git_credentials()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(spec: &str) -> GitLabProvider {
        GitLabProvider::new(spec, &GitLabSettings::default(), reqwest::Client::new()).unwrap()
    }

    #[test]
    fn api_url_escapes_namespace_and_ref() {
        let provider = provider("gitlab-org%2Fgitlab-foss/feature%2Fbranch");
        assert_eq!(
            provider.api_url(),
            "https://gitlab.com/api/v4/projects/gitlab-org%2Fgitlab-foss/repository/commits/feature%2Fbranch"
        );
    }

    #[test]
    fn urls_and_slug() {
        let provider = provider("gitlab-org%2Fgitlab-foss/master");
        assert_eq!(provider.namespace(), "gitlab-org/gitlab-foss");
        assert_eq!(
            provider.repo_url(),
            "https://gitlab.com/gitlab-org/gitlab-foss.git"
        );
        assert_eq!(provider.build_slug().unwrap(), "gitlab_-org-gitlab_-foss");
    }

    #[test]
    fn credentials_from_private_token() {
        let settings = GitLabSettings {
            private_token: "secret".to_string(),
            ..Default::default()
        };
        let provider =
            GitLabProvider::new("a%2Fb/master", &settings, reqwest::Client::new()).unwrap();
        assert_eq!(
            provider.git_credentials(),
            r"username=binderhub\npassword=secret"
        );
    }

    #[test]
    fn empty_ref_is_rejected() {
        let err = GitLabProvider::new(
            "a%2Fb/",
            &GitLabSettings::default(),
            reqwest::Client::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
    }
}
