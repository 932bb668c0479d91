//! Shared helpers for provider tests against a mock API server.

#![allow(dead_code)]

use repospec_core::config::RepoSpecConfig;
use repospec_core::provider::ProviderRegistry;
use wiremock::ResponseTemplate;

pub const SHA_A: &str = "f7f3ff6d1bf708bdc12e5f10e18b2a90a4795603";
pub const SHA_B: &str = "0123456789abcdef0123456789abcdef01234567";
pub const SHA_C: &str = "89abcdef0123456789abcdef0123456789abcdef";

/// Config pointing every API at the mock server.
pub fn mock_config(server_uri: &str) -> RepoSpecConfig {
    let mut config = RepoSpecConfig::default();
    config.github.api_url = Some(server_uri.to_string());
    config.gitlab.api_url = Some(format!("{server_uri}/api/v4"));
    config.zenodo.doi_resolver = server_uri.to_string();
    config
}

pub fn registry(config: RepoSpecConfig) -> ProviderRegistry {
    ProviderRegistry::new(config).unwrap()
}

/// Unix timestamp `seconds` from now.
pub fn reset_in(seconds: i64) -> String {
    (chrono::Utc::now().timestamp() + seconds).to_string()
}

/// Attach GitHub rate-limit headers to a response.
pub fn with_rate_limit(
    template: ResponseTemplate,
    remaining: i64,
    limit: i64,
) -> ResponseTemplate {
    template
        .insert_header("x-ratelimit-remaining", remaining.to_string().as_str())
        .insert_header("x-ratelimit-limit", limit.to_string().as_str())
        .insert_header("x-ratelimit-reset", reset_in(3600).as_str())
}
