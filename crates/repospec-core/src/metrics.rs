//! Rate-limit gauge published by the GitHub API client.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Gauge of remaining GitHub API requests.
///
/// Cloning yields another handle to the same value, so one gauge can be
/// shared by every GitHub-family resolver and read by an exporter.
#[derive(Debug, Clone, Default)]
pub struct RateLimitGauge {
    remaining: Arc<AtomicI64>,
}

impl RateLimitGauge {
    /// Metric name under which the value is exported.
    pub const NAME: &'static str = "github_rate_limit_remaining";
    pub const HELP: &'static str = "GitHub rate limit remaining";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, remaining: i64) {
        self.remaining.store(remaining, Ordering::Relaxed);
    }

    pub fn get(&self) -> i64 {
        self.remaining.load(Ordering::Relaxed)
    }

    /// Render in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        format!(
            "# HELP {name} {help}\n# TYPE {name} gauge\n{name} {value}\n",
            name = Self::NAME,
            help = Self::HELP,
            value = self.get()
        )
    }
}
