//! GitHub rate-limit headers and what to do about them.

use reqwest::header::HeaderMap;

use crate::error::{ProviderError, Result};

const REMAINING: &str = "x-ratelimit-remaining";
const LIMIT: &str = "x-ratelimit-limit";
const RESET: &str = "x-ratelimit-reset";

/// Log level for a rate-limit report, picked from the remaining fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitSeverity {
    Warn,
    Info,
    Debug,
}

/// Rate-limit information carried by a GitHub API response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitState {
    pub remaining: i64,
    pub limit: i64,
    /// Unix timestamp at which the window resets
    pub reset: i64,
}

impl RateLimitState {
    /// Read the three `x-ratelimit-*` headers.
    ///
    /// Returns `Ok(None)` when the server does not rate limit (no headers),
    /// and an error when the headers are present but unreadable.
    pub fn from_headers(headers: &HeaderMap) -> Result<Option<Self>> {
        let Some(remaining) = header_i64(headers, REMAINING)? else {
            return Ok(None);
        };
        let limit = header_i64(headers, LIMIT)?
            .ok_or_else(|| missing_header(LIMIT))?;
        let reset = header_i64(headers, RESET)?
            .ok_or_else(|| missing_header(RESET))?;
        Ok(Some(Self {
            remaining,
            limit,
            reset,
        }))
    }

    /// Warn below 20% remaining, info below 50%, debug otherwise.
    pub fn severity(&self) -> RateLimitSeverity {
        if self.limit <= 0 {
            return RateLimitSeverity::Warn;
        }
        let fraction = self.remaining as f64 / self.limit as f64;
        if fraction < 0.2 {
            RateLimitSeverity::Warn
        } else if fraction < 0.5 {
            RateLimitSeverity::Info
        } else {
            RateLimitSeverity::Debug
        }
    }

    pub fn seconds_until_reset(&self, now: i64) -> i64 {
        self.reset - now
    }
}

/// True if the response says the quota is used up.
pub fn is_exhausted(headers: &HeaderMap) -> bool {
    headers
        .get(REMAINING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0")
}

/// Wait before retrying, rounded up to the next 5-minute boundary.
pub fn minutes_until_reset(reset_seconds: i64) -> i64 {
    5 * (1 + reset_seconds.div_euclid(60).div_euclid(5))
}

/// Format a duration in seconds as `H:MM:SS`.
pub fn format_delta(seconds: i64) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let seconds = seconds.unsigned_abs();
    format!(
        "{sign}{}:{:02}:{:02}",
        seconds / 3600,
        (seconds / 60) % 60,
        seconds % 60
    )
}

fn header_i64(headers: &HeaderMap, name: &str) -> Result<Option<i64>> {
    let Some(value) = headers.get(name) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .map(Some)
        .ok_or_else(|| {
            ProviderError::InvalidResponse(format!("Malformed {name} header: {value:?}"))
        })
}

fn missing_header(name: &str) -> ProviderError {
    ProviderError::InvalidResponse(format!("Missing {name} header"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn minutes_round_up_to_five() {
        assert_eq!(minutes_until_reset(0), 5);
        assert_eq!(minutes_until_reset(130), 5);
        assert_eq!(minutes_until_reset(299), 5);
        assert_eq!(minutes_until_reset(300), 10);
        assert_eq!(minutes_until_reset(3599), 60);
    }

    #[test]
    fn severity_thresholds() {
        let state = |remaining| RateLimitState {
            remaining,
            limit: 100,
            reset: 0,
        };
        assert_eq!(state(19).severity(), RateLimitSeverity::Warn);
        assert_eq!(state(20).severity(), RateLimitSeverity::Info);
        assert_eq!(state(49).severity(), RateLimitSeverity::Info);
        assert_eq!(state(50).severity(), RateLimitSeverity::Debug);
        assert_eq!(state(100).severity(), RateLimitSeverity::Debug);
    }

    #[test]
    fn parses_headers() {
        let map = headers(&[
            ("x-ratelimit-remaining", "4990"),
            ("x-ratelimit-limit", "5000"),
            ("x-ratelimit-reset", "1700000000"),
        ]);
        let state = RateLimitState::from_headers(&map).unwrap().unwrap();
        assert_eq!(state.remaining, 4990);
        assert_eq!(state.limit, 5000);
        assert_eq!(state.seconds_until_reset(1_699_999_870), 130);
    }

    #[test]
    fn absent_headers_mean_no_rate_limit() {
        assert_eq!(RateLimitState::from_headers(&HeaderMap::new()).unwrap(), None);
    }

    #[test]
    fn malformed_header_is_an_error() {
        let map = headers(&[
            ("x-ratelimit-remaining", "lots"),
            ("x-ratelimit-limit", "5000"),
            ("x-ratelimit-reset", "1"),
        ]);
        assert!(RateLimitState::from_headers(&map).is_err());

        let map = headers(&[("x-ratelimit-remaining", "5")]);
        assert!(RateLimitState::from_headers(&map).is_err());
    }

    #[test]
    fn exhausted_only_at_zero() {
        assert!(is_exhausted(&headers(&[("x-ratelimit-remaining", "0")])));
        assert!(!is_exhausted(&headers(&[("x-ratelimit-remaining", "1")])));
        assert!(!is_exhausted(&HeaderMap::new()));
    }

    #[test]
    fn delta_formatting() {
        assert_eq!(format_delta(130), "0:02:10");
        assert_eq!(format_delta(3725), "1:02:05");
        assert_eq!(format_delta(-5), "-0:00:05");
    }
}
