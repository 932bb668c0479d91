//! Error types for repository spec resolution.
//!
//! "Not found" is deliberately absent: a missing ref, commit or gist version
//! is reported as `Ok(None)` from [`RepoProvider::resolve_ref`].
//!
//! [`RepoProvider::resolve_ref`]: crate::provider::RepoProvider::resolve_ref

use thiserror::Error;

/// Errors that can occur while parsing, checking or resolving a spec.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Malformed spec or missing ref
    #[error("{0}")]
    Validation(String),

    /// Access to the requested resource is not permitted by configuration
    #[error("{0}")]
    Permission(String),

    /// The upstream API quota is exhausted
    #[error("GitHub rate limit exceeded. Try again in {minutes} minutes.")]
    RateLimitExceeded {
        /// Advisory wait, rounded up to the next 5-minute boundary
        minutes: i64,
    },

    /// Unexpected HTTP status
    #[error("HTTP error: {status} from {url}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
        /// URL without auth parameters
        url: String,
    },

    /// Network-level failure, with the request URL (and its auth
    /// parameters) stripped
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    /// Upstream response that could not be interpreted
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Malformed policy configuration or a provider used incorrectly
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ProviderError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub(crate) fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// True for failures talking to the upstream service.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::HttpStatus { .. } | Self::Http(_) | Self::InvalidResponse(_)
        )
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.without_url())
    }
}

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;
