//! Zenodo records, addressed by DOI.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use super::{ProviderKind, RepoProvider};
use crate::config::ZenodoSettings;
use crate::error::{ProviderError, Result};

/// Provider for a Zenodo record.
///
/// The spec is a DOI. Resolution follows the DOI redirects; the record id
/// is the last path segment of the final URL.
#[derive(Debug)]
pub struct ZenodoProvider {
    spec: String,
    doi_resolver: String,
    client: reqwest::Client,
    record_id: OnceCell<String>,
}

impl ZenodoProvider {
    pub fn new(
        spec: impl Into<String>,
        settings: &ZenodoSettings,
        client: reqwest::Client,
    ) -> Self {
        Self {
            spec: spec.into(),
            doi_resolver: settings.doi_resolver.trim_end_matches('/').to_string(),
            client,
            record_id: OnceCell::new(),
        }
    }

    async fn fetch_record_id(&self) -> Result<String> {
        let doi_url = format!("{}/{}", self.doi_resolver, self.spec);
        debug!(url = %doi_url, "Resolving DOI");

        let response = self.client.get(&doi_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::HttpStatus {
                status: status.as_u16(),
                url: doi_url,
            });
        }

        let final_url = response.url();
        debug!(url = %final_url, "DOI resolved");
        final_url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
            .map(str::to_string)
            .ok_or_else(|| {
                ProviderError::InvalidResponse(format!(
                    "DOI {} resolved to {final_url}, which has no record id",
                    self.spec
                ))
            })
    }
}

#[async_trait]
impl RepoProvider for ZenodoProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Zenodo
    }

    fn spec(&self) -> &str {
        &self.spec
    }

    fn unresolved_ref(&self) -> &str {
        ""
    }

    /// Resolves to the Zenodo record id rather than a commit.
    async fn resolve_ref(&self) -> Result<Option<String>> {
        let record_id = self
            .record_id
            .get_or_try_init(|| self.fetch_record_id())
            .await?;
        Ok(Some(record_id.clone()))
    }

    /// The DOI itself: the build step fetches the record by DOI.
    fn repo_url(&self) -> String {
        self.spec.clone()
    }

    fn build_slug(&self) -> Result<String> {
        self.record_id
            .get()
            .map(|id| format!("zenodo-{id}"))
            .ok_or_else(|| {
                ProviderError::configuration(
                    "Zenodo build slug requested before the DOI was resolved",
                )
            })
    }
}
