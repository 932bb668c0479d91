//! Shared HTTP plumbing for the network-backed providers.

use url::Url;

use crate::error::{ProviderError, Result};

/// User-Agent sent with every API request.
pub const USER_AGENT: &str = concat!("repospec/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client shared by all providers.
///
/// Redirects are followed (DOI resolution relies on it); there is no
/// request timeout, callers cancel by dropping the future.
pub fn build_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().user_agent(USER_AGENT).build()?)
}

/// Append query parameters to a URL.
///
/// Used to attach credentials, so call it only after the plain URL has been
/// logged.
pub fn with_query(url: &str, params: &[(String, String)]) -> Result<Url> {
    let mut url = Url::parse(url)
        .map_err(|e| ProviderError::validation(format!("Invalid API URL '{url}': {e}")))?;
    if !params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in params {
            pairs.append_pair(key, value);
        }
    }
    Ok(url)
}

/// Collect the non-empty credentials as query parameters, in the given order.
pub fn auth_params(fields: &[(&str, &str)]) -> Vec<(String, String)> {
    fields
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}
