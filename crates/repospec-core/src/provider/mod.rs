//! Repository providers.
//!
//! Each provider turns one spec string into a resolved ref, a clone URL and
//! a build slug. Construction parses and validates the spec without any
//! network access; [`RepoProvider::resolve_ref`] does the I/O and memoizes
//! its outcome for the lifetime of the instance.

mod fake;
mod gist;
mod git;
mod github;
mod gitlab;
mod registry;
mod zenodo;

pub use fake::FakeProvider;
pub use gist::GistProvider;
pub use git::GitProvider;
pub use github::GitHubProvider;
pub use gitlab::GitLabProvider;
pub use registry::ProviderRegistry;
pub use zenodo::ZenodoProvider;

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

use crate::error::{ProviderError, Result};
use crate::spec::is_sha1;

/// The supported hosting back ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    GitHub,
    Gist,
    Git,
    GitLab,
    Zenodo,
    /// Canned answers, for offline testing
    Fake,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 6] = [
        ProviderKind::GitHub,
        ProviderKind::Gist,
        ProviderKind::Git,
        ProviderKind::GitLab,
        ProviderKind::Zenodo,
        ProviderKind::Fake,
    ];

    /// Short prefix used in launch URLs, e.g. `gh` in `gh/user/repo/ref`.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::GitHub => "gh",
            Self::Gist => "gist",
            Self::Git => "git",
            Self::GitLab => "gl",
            Self::Zenodo => "zenodo",
            Self::Fake => "fake",
        }
    }

    /// Human readable name.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::GitHub => "GitHub",
            Self::Gist => "Gist",
            Self::Git => "Git",
            Self::GitLab => "GitLab",
            Self::Zenodo => "Zenodo",
            Self::Fake => "Fake",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    /// Accepts either the prefix or the display name, ignoring case.
    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| {
                s.eq_ignore_ascii_case(kind.prefix()) || s.eq_ignore_ascii_case(kind.display_name())
            })
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(|k| k.prefix()).collect();
                ProviderError::validation(format!(
                    "Unknown provider '{s}'. Expected one of: {}",
                    known.join(", ")
                ))
            })
    }
}

/// Common contract of every provider.
#[async_trait]
pub trait RepoProvider: Send + Sync + fmt::Debug {
    fn kind(&self) -> ProviderKind;

    fn name(&self) -> &'static str {
        self.kind().display_name()
    }

    /// The spec this provider was built from.
    fn spec(&self) -> &str;

    /// The human-chosen ref extracted from the spec (may be empty).
    fn unresolved_ref(&self) -> &str;

    /// Resolve the spec to an immutable identifier.
    ///
    /// Returns `Ok(None)` if the ref does not exist. The first completed
    /// outcome is memoized; errors are not.
    async fn resolve_ref(&self) -> Result<Option<String>>;

    /// URL handed to the clone step.
    fn repo_url(&self) -> String;

    /// Short stable name for artifacts built from this repository.
    fn build_slug(&self) -> Result<String>;

    /// Credentials for the clone step, in `username=...\npassword=...` form,
    /// or empty.
    fn git_credentials(&self) -> String {
        String::new()
    }
}

/// Accept an identifier returned by an API only if it is a full SHA-1.
fn checked_sha(value: &str, api_url: &str) -> Result<String> {
    if is_sha1(value) {
        Ok(value.to_string())
    } else {
        Err(ProviderError::InvalidResponse(format!(
            "{api_url} returned \"{value}\", which is not a sha1 hexadecimal hash"
        )))
    }
}
