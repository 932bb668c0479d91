//! Spec string parsing for each provider.
//!
//! Supported formats:
//! - GitHub: `user/repo/ref` (ref may contain `/`)
//! - Gist: `user/gist-id[/ref]`
//! - GitLab: `<url-escaped-namespace>/<ref>`
//! - Git: `<url-escaped-repo-url>/<40-hex-sha>`
//! - Zenodo: a DOI, used verbatim

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::error::{ProviderError, Result};

/// Everything except RFC 3986 unreserved characters is escaped, including `/`.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Escape a value so it can be used as a single URL path segment.
pub fn quote(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

/// Decode percent-escapes. Invalid UTF-8 is replaced rather than rejected.
pub fn unquote(value: &str) -> String {
    percent_decode_str(value).decode_utf8_lossy().into_owned()
}

/// Check that a value is a full, lowercase, hexadecimal SHA-1.
pub fn is_sha1(value: &str) -> bool {
    value.len() == 40 && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Reject anything that is not a full SHA-1.
pub fn validate_sha1(value: &str) -> Result<()> {
    if is_sha1(value) {
        Ok(())
    } else {
        Err(ProviderError::validation(format!(
            "resolved_ref is not a valid sha1 hexadecimal hash: \"{value}\""
        )))
    }
}

/// Remove `suffix` from the end of `text` if present.
pub fn strip_suffix<'a>(text: &'a str, suffix: &str) -> &'a str {
    text.strip_suffix(suffix).unwrap_or(text)
}

/// Split a GitHub-style `user/repo/ref` spec into its three parts.
///
/// Only the first two `/` separate parts, so the ref may itself contain `/`.
pub fn tokenize_spec(spec: &str) -> Result<(String, String, String)> {
    let parts: Vec<&str> = spec.splitn(3, '/').collect();
    if let [user, repo, unresolved_ref] = parts.as_slice() {
        return Ok((
            user.to_string(),
            repo.to_string(),
            unresolved_ref.to_string(),
        ));
    }

    let mut msg = format!("Spec is not of the form \"user/repo/ref\", provided: \"{spec}\".");
    if parts.len() == 2 && parts[1] != "master" {
        msg.push_str(&format!(" Did you mean \"{spec}/master\"?"));
    }
    Err(ProviderError::Validation(msg))
}

/// Parsed `user/repo/ref` spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubSpec {
    pub user: String,
    /// Repository name with any trailing `.git` removed
    pub repo: String,
    pub unresolved_ref: String,
}

impl GitHubSpec {
    pub fn parse(spec: &str) -> Result<Self> {
        let (user, repo, unresolved_ref) = tokenize_spec(spec)?;
        let repo = strip_suffix(&repo, ".git").to_string();
        Ok(Self {
            user,
            repo,
            unresolved_ref,
        })
    }
}

/// Parsed `user/gist-id[/ref]` spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GistSpec {
    pub user: String,
    pub gist_id: String,
    /// Empty when no ref was given, meaning the latest revision
    pub unresolved_ref: String,
}

impl GistSpec {
    pub fn parse(spec: &str) -> Result<Self> {
        let mut parts = spec.split('/');
        let (Some(user), Some(gist_id)) = (parts.next(), parts.next()) else {
            return Err(ProviderError::validation(format!(
                "Spec is not of the form \"user/gist-id[/ref]\", provided: \"{spec}\"."
            )));
        };
        if gist_id.is_empty() {
            return Err(ProviderError::validation(format!(
                "Spec is missing a gist id, provided: \"{spec}\"."
            )));
        }
        let unresolved_ref = parts.next().unwrap_or_default();

        Ok(Self {
            user: user.to_string(),
            gist_id: gist_id.to_string(),
            unresolved_ref: unresolved_ref.to_string(),
        })
    }

    /// Whether the spec asks for the newest revision.
    pub fn wants_latest(&self) -> bool {
        self.unresolved_ref.is_empty() || self.unresolved_ref == "master"
    }
}

/// Parsed `<escaped-namespace>/<ref>` spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitLabSpec {
    /// Decoded namespace, e.g. `group/project/repo`
    pub namespace: String,
    /// Decoded ref; may contain `/`
    pub unresolved_ref: String,
}

impl GitLabSpec {
    pub fn parse(spec: &str) -> Result<Self> {
        let (quoted_namespace, quoted_ref) = spec.split_once('/').ok_or_else(|| {
            ProviderError::validation(format!(
                "Spec is not of the form \"<url-escaped-namespace>/<ref>\", provided: \"{spec}\"."
            ))
        })?;

        let unresolved_ref = unquote(quoted_ref);
        if unresolved_ref.is_empty() {
            return Err(ProviderError::validation("An unresolved ref is required"));
        }

        Ok(Self {
            namespace: unquote(quoted_namespace),
            unresolved_ref,
        })
    }

    /// Slug built from the namespace: segments joined by `-`, with `-`
    /// inside a segment escaped as `_-` so distinct namespaces stay distinct.
    pub fn build_slug(&self) -> String {
        self.namespace
            .split('/')
            .map(|segment| segment.replace('-', "_-"))
            .collect::<Vec<_>>()
            .join("-")
    }
}

/// Parsed `<escaped-repo-url>/<sha>` spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitSpec {
    /// Decoded clone URL
    pub repo: String,
    pub resolved_ref: String,
}

impl GitSpec {
    pub fn parse(spec: &str) -> Result<Self> {
        let (quoted_repo, resolved_ref) = spec.rsplit_once('/').ok_or_else(|| {
            ProviderError::validation(format!(
                "Spec is not of the form \"<url-escaped-repo>/<sha>\", provided: \"{spec}\"."
            ))
        })?;

        if resolved_ref.is_empty() {
            return Err(ProviderError::validation(
                "`resolved_ref` must be specified for the basic git provider",
            ));
        }
        validate_sha1(resolved_ref)?;

        Ok(Self {
            repo: unquote(quoted_repo),
            resolved_ref: resolved_ref.to_string(),
        })
    }
}
