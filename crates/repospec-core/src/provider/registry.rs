//! Provider registry: builds providers that share one cache and one client.

use std::sync::Arc;

use super::{
    FakeProvider, GistProvider, GitHubProvider, GitLabProvider, GitProvider, ProviderKind,
    RepoProvider, ZenodoProvider,
};
use crate::cache::RefCache;
use crate::config::RepoSpecConfig;
use crate::error::Result;
use crate::github::GitHubApi;
use crate::http;
use crate::metrics::RateLimitGauge;
use crate::policy::{PolicyMatcher, RepoConfig};

/// Process-wide provider factory.
///
/// Construct once. Every GitHub provider it builds shares the same
/// [`RefCache`], and GitHub-family providers share the same rate-limit gauge.
#[derive(Debug)]
pub struct ProviderRegistry {
    config: RepoSpecConfig,
    client: reqwest::Client,
    github_api: GitHubApi,
    cache: Arc<RefCache>,
    policy: PolicyMatcher,
}

impl ProviderRegistry {
    /// Uses `config` as given. Environment defaults (`GITHUB_ACCESS_TOKEN`
    /// and friends) are only filled in by [`load_config`] or
    /// [`RepoSpecConfig::apply_env`]; call the latter first when building a
    /// config by hand.
    ///
    /// [`load_config`]: crate::config::load_config
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a zero cache capacity or a
    /// malformed policy, and a transport error if the HTTP client cannot be
    /// built.
    pub fn new(config: RepoSpecConfig) -> Result<Self> {
        let client = http::build_client()?;
        Self::with_client(config, client)
    }

    /// Like [`ProviderRegistry::new`] with a caller-supplied HTTP client.
    pub fn with_client(config: RepoSpecConfig, client: reqwest::Client) -> Result<Self> {
        let cache = Arc::new(RefCache::new(config.cache.capacity)?);
        let policy = PolicyMatcher::new(&config.policy)?;
        let github_api =
            GitHubApi::new(client.clone(), config.github.auth(), RateLimitGauge::new());
        Ok(Self {
            config,
            client,
            github_api,
            cache,
            policy,
        })
    }

    /// Parse `spec` for the given provider. No network access happens here.
    pub fn build(&self, kind: ProviderKind, spec: &str) -> Result<Box<dyn RepoProvider>> {
        let provider: Box<dyn RepoProvider> = match kind {
            ProviderKind::GitHub => Box::new(GitHubProvider::new(
                spec,
                &self.config.github,
                self.github_api.clone(),
                Arc::clone(&self.cache),
            )?),
            ProviderKind::Gist => Box::new(GistProvider::new(
                spec,
                &self.config.gist,
                &self.config.github,
                self.github_api.clone(),
            )?),
            ProviderKind::Git => Box::new(GitProvider::new(spec)?),
            ProviderKind::GitLab => Box::new(GitLabProvider::new(
                spec,
                &self.config.gitlab,
                self.client.clone(),
            )?),
            ProviderKind::Zenodo => Box::new(ZenodoProvider::new(
                spec,
                &self.config.zenodo,
                self.client.clone(),
            )),
            ProviderKind::Fake => Box::new(FakeProvider::new(spec)),
        };
        Ok(provider)
    }

    pub fn config(&self) -> &RepoSpecConfig {
        &self.config
    }

    pub fn policy(&self) -> &PolicyMatcher {
        &self.policy
    }

    pub fn is_banned(&self, spec: &str) -> bool {
        self.policy.is_banned(spec)
    }

    pub fn has_higher_quota(&self, spec: &str) -> bool {
        self.policy.has_higher_quota(spec)
    }

    /// Quota tier merged with matching overrides.
    pub fn repo_config(&self, spec: &str) -> RepoConfig {
        self.policy.repo_config(spec, &self.config.policy.quotas)
    }

    pub fn cache(&self) -> &Arc<RefCache> {
        &self.cache
    }

    pub fn rate_limit_gauge(&self) -> &RateLimitGauge {
        self.github_api.gauge()
    }
}
