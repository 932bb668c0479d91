//! repospec Core Library
//!
//! Resolves provider-specific repository specs (`gh/user/repo/ref`,
//! `gl/group%2Frepo/ref`, gists, bare git URLs, Zenodo DOIs) into an
//! immutable ref, a clone URL and a build slug, and applies per-spec
//! ban, quota and configuration policy.

pub mod cache;
pub mod config;
pub mod error;
pub mod github;
pub mod http;
pub mod metrics;
pub mod policy;
pub mod provider;
pub mod spec;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{RepoSpecConfig, load_config};

    // Errors
    pub use crate::error::{ProviderError, Result};

    // Providers
    pub use crate::provider::{ProviderKind, ProviderRegistry, RepoProvider};

    // Policy
    pub use crate::policy::{PolicyMatcher, RepoConfig};

    // Cache and metrics
    pub use crate::cache::{CacheEntry, RefCache};
    pub use crate::metrics::RateLimitGauge;
}
