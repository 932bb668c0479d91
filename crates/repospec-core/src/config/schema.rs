//! Configuration schema for repospec.toml
//!
//! ```toml
//! [github]
//! hostname = "github.com"
//! access_token = "..."
//!
//! [gitlab]
//! hostname = "gitlab.example.org"
//!
//! [gist]
//! allow_secret_gist = false
//!
//! [cache]
//! capacity = 1024
//!
//! [policy]
//! banned_specs = ["^evil/.*"]
//! high_quota_specs = ["^jupyterhub/.*"]
//! per_repo_quota = 100
//! per_repo_quota_higher = 200
//!
//! [[policy.spec_config]]
//! pattern = "^jupyterhub/binderhub.*"
//! config = { quota = 999 }
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_CAPACITY;
use crate::http::auth_params;
use crate::policy::{PolicyMatcher, PolicySettings};

/// Root configuration structure for repospec.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoSpecConfig {
    #[serde(default)]
    pub github: GitHubSettings,

    #[serde(default)]
    pub gitlab: GitLabSettings,

    #[serde(default)]
    pub gist: GistSettings,

    #[serde(default)]
    pub zenodo: ZenodoSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub policy: PolicySettings,
}

impl RepoSpecConfig {
    /// Fill unset credentials from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Fill unset credentials using `lookup` in place of the environment.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        self.github.apply_env_with(&lookup);
        self.gitlab.apply_env_with(&lookup);
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.cache.capacity == 0 {
            anyhow::bail!("Invalid cache configuration: capacity must be non-zero");
        }
        PolicyMatcher::new(&self.policy).context("Invalid policy configuration")?;
        Ok(())
    }
}

fn fill(field: &mut String, key: &str, lookup: &impl Fn(&str) -> Option<String>) {
    if field.is_empty()
        && let Some(value) = lookup(key)
    {
        *field = value;
    }
}

/// GitHub (and GitHub Enterprise) access
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubSettings {
    /// Web hostname, e.g. `github.com`
    #[serde(default = "default_github_hostname")]
    pub hostname: String,

    /// API base URL; defaults to `https://api.<hostname>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// OAuth client id (`GITHUB_CLIENT_ID`)
    #[serde(default)]
    pub client_id: String,

    /// OAuth client secret (`GITHUB_CLIENT_SECRET`)
    #[serde(default)]
    pub client_secret: String,

    /// Access token (`GITHUB_ACCESS_TOKEN`)
    #[serde(default)]
    pub access_token: String,
}

fn default_github_hostname() -> String {
    "github.com".to_string()
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            hostname: default_github_hostname(),
            api_url: None,
            client_id: String::new(),
            client_secret: String::new(),
            access_token: String::new(),
        }
    }
}

impl GitHubSettings {
    pub fn api_url(&self) -> String {
        match &self.api_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://api.{}", self.hostname),
        }
    }

    /// Query parameters authenticating API requests.
    pub fn auth(&self) -> Vec<(String, String)> {
        auth_params(&[
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("access_token", self.access_token.as_str()),
        ])
    }

    /// Credentials for cloning over HTTPS.
    ///
    /// With a client id the token is treated as a personal access token,
    /// otherwise as an OAuth token used with the `x-oauth-basic` password.
    pub fn git_credentials(&self) -> String {
        if self.access_token.is_empty() {
            return String::new();
        }
        if self.client_id.is_empty() {
            format!(r"username={}\npassword=x-oauth-basic", self.access_token)
        } else {
            format!(
                r"username={}\npassword={}",
                self.client_id, self.access_token
            )
        }
    }

    fn apply_env_with(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        fill(&mut self.client_id, "GITHUB_CLIENT_ID", lookup);
        fill(&mut self.client_secret, "GITHUB_CLIENT_SECRET", lookup);
        fill(&mut self.access_token, "GITHUB_ACCESS_TOKEN", lookup);
    }
}

/// GitLab (gitlab.com or self-hosted) access
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitLabSettings {
    #[serde(default = "default_gitlab_hostname")]
    pub hostname: String,

    /// API base URL; defaults to `https://<hostname>/api/v4`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// OAuth2 access token (`GITLAB_ACCESS_TOKEN`)
    #[serde(default)]
    pub access_token: String,

    /// Private token (`GITLAB_PRIVATE_TOKEN`)
    #[serde(default)]
    pub private_token: String,
}

fn default_gitlab_hostname() -> String {
    "gitlab.com".to_string()
}

impl Default for GitLabSettings {
    fn default() -> Self {
        Self {
            hostname: default_gitlab_hostname(),
            api_url: None,
            access_token: String::new(),
            private_token: String::new(),
        }
    }
}

impl GitLabSettings {
    pub fn api_url(&self) -> String {
        match &self.api_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}/api/v4", self.hostname),
        }
    }

    pub fn auth(&self) -> Vec<(String, String)> {
        auth_params(&[
            ("access_token", self.access_token.as_str()),
            ("private_token", self.private_token.as_str()),
        ])
    }

    pub fn git_credentials(&self) -> String {
        if self.private_token.is_empty() {
            String::new()
        } else {
            format!(r"username=binderhub\npassword={}", self.private_token)
        }
    }

    fn apply_env_with(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        fill(&mut self.access_token, "GITLAB_ACCESS_TOKEN", lookup);
        fill(&mut self.private_token, "GITLAB_PRIVATE_TOKEN", lookup);
    }
}

/// Gist access; credentials are shared with `[github]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GistSettings {
    /// Allow resolving secret (non-public) gists
    #[serde(default)]
    pub allow_secret_gist: bool,

    /// API base URL; defaults to the GitHub API URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl GistSettings {
    pub fn api_url(&self, github: &GitHubSettings) -> String {
        match &self.api_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => github.api_url(),
        }
    }
}

/// Zenodo DOI resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZenodoSettings {
    #[serde(default = "default_doi_resolver")]
    pub doi_resolver: String,
}

fn default_doi_resolver() -> String {
    "https://doi.org".to_string()
}

impl Default for ZenodoSettings {
    fn default() -> Self {
        Self {
            doi_resolver: default_doi_resolver(),
        }
    }
}

/// Resolved-ref cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

fn default_cache_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
        }
    }
}
