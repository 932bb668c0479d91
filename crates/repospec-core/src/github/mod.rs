//! Rate-limit aware client for the GitHub REST API.
//!
//! Shared by the GitHub and Gist providers. Requests may be made conditional
//! with an `ETag`; the caller owns caching of the results.

mod rate_limit;

pub use rate_limit::{
    RateLimitSeverity, RateLimitState, format_delta, is_exhausted, minutes_until_reset,
};

use reqwest::StatusCode;
use reqwest::header::{ETAG, HeaderMap, IF_NONE_MATCH};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::{ProviderError, Result};
use crate::http;
use crate::metrics::RateLimitGauge;

/// Outcome of a GitHub API request that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// 2xx with a JSON body
    Fresh {
        etag: Option<String>,
        body: Value,
    },
    /// 304: the resource matches the `ETag` that was sent
    NotModified,
    /// 404 or 422: the repository, ref or gist does not exist
    NotFound,
}

/// GitHub API client with credentials and a rate-limit gauge.
///
/// Cheap to clone; clones share the connection pool and the gauge.
#[derive(Debug, Clone)]
pub struct GitHubApi {
    client: reqwest::Client,
    auth: Vec<(String, String)>,
    gauge: RateLimitGauge,
}

impl GitHubApi {
    /// `auth` is appended to every request as query parameters.
    pub fn new(
        client: reqwest::Client,
        auth: Vec<(String, String)>,
        gauge: RateLimitGauge,
    ) -> Self {
        Self {
            client,
            auth,
            gauge,
        }
    }

    pub fn gauge(&self) -> &RateLimitGauge {
        &self.gauge
    }

    /// GET `api_url`, conditionally if `etag` is given.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::RateLimitExceeded`] on a 403 with no requests left
    /// - [`ProviderError::HttpStatus`] on any other unexpected status
    /// - [`ProviderError::Http`] if the request could not be made
    pub async fn request(&self, api_url: &str, etag: Option<&str>) -> Result<ApiResponse> {
        // `api_url` has already been logged by the caller; credentials are
        // added only now.
        let url = http::with_query(api_url, &self.auth)?;

        let mut request = self.client.get(url);
        if let Some(etag) = etag {
            request = request.header(IF_NONE_MATCH, etag);
        }
        let response = request.send().await?;
        let status = response.status();

        match status {
            StatusCode::NOT_MODIFIED => {
                self.record_rate_limit(response.headers());
                Ok(ApiResponse::NotModified)
            }
            status if status.is_success() => {
                self.record_rate_limit(response.headers());
                let etag = response
                    .headers()
                    .get(ETAG)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let body = response.json::<Value>().await?;
                Ok(ApiResponse::Fresh { etag, body })
            }
            StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => {
                debug!(url = api_url, status = status.as_u16(), "GitHub object not found");
                Ok(ApiResponse::NotFound)
            }
            StatusCode::FORBIDDEN if is_exhausted(response.headers()) => {
                Err(rate_limit_exceeded(response.headers())?)
            }
            status => Err(ProviderError::HttpStatus {
                status: status.as_u16(),
                url: api_url.to_string(),
            }),
        }
    }

    /// Publish and log the rate-limit headers of a successful response.
    ///
    /// Malformed values are logged and skipped; the request still succeeds.
    fn record_rate_limit(&self, headers: &HeaderMap) {
        let state = match RateLimitState::from_headers(headers) {
            Ok(Some(state)) => state,
            Ok(None) => {
                debug!("GitHub response carried no rate limit headers");
                return;
            }
            Err(err) => {
                warn!(error = %err, "Ignoring malformed GitHub rate limit headers");
                return;
            }
        };

        self.gauge.set(state.remaining);

        let delta = format_delta(state.seconds_until_reset(chrono::Utc::now().timestamp()));
        let (remaining, limit) = (state.remaining, state.limit);
        match state.severity() {
            RateLimitSeverity::Warn => warn!(
                remaining,
                limit,
                "GitHub rate limit remaining {remaining}/{limit}. Reset in {delta}."
            ),
            RateLimitSeverity::Info => info!(
                remaining,
                limit,
                "GitHub rate limit remaining {remaining}/{limit}. Reset in {delta}."
            ),
            RateLimitSeverity::Debug => debug!(
                remaining,
                limit,
                "GitHub rate limit remaining {remaining}/{limit}. Reset in {delta}."
            ),
        }
    }
}

/// Build the error for an exhausted quota from a 403 response.
fn rate_limit_exceeded(headers: &HeaderMap) -> Result<ProviderError> {
    let state = RateLimitState::from_headers(headers)?.ok_or_else(|| {
        ProviderError::InvalidResponse("Missing x-ratelimit-remaining header".to_string())
    })?;
    let reset_seconds = state.seconds_until_reset(chrono::Utc::now().timestamp());
    error!(
        limit = state.limit,
        "GitHub rate limit ({}) exceeded. Reset in {}.",
        state.limit,
        format_delta(reset_seconds)
    );
    Ok(ProviderError::RateLimitExceeded {
        minutes: minutes_until_reset(reset_seconds),
    })
}
