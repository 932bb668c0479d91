//! Credentials are appended to API requests but never show up in logs or
//! in error text.

mod support;

use std::io;
use std::sync::{Arc, Mutex};

use repospec_core::config::RepoSpecConfig;
use repospec_core::provider::ProviderKind;
use serde_json::json;
use support::{SHA_A, mock_config, registry, with_rate_limit};
use tracing::subscriber::DefaultGuard;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRETS: [&str; 4] = [
    "gh-client-secret",
    "gh-s3cr3t-token",
    "gl-s3cr3t-token",
    "glpat-s3cr3t",
];

/// In-memory sink for formatted log lines.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture_logs() -> (LogBuffer, DefaultGuard) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter("repospec_core=trace")
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buffer, guard)
}

fn with_credentials(mut config: RepoSpecConfig) -> RepoSpecConfig {
    config.github.client_id = "gh-client".to_string();
    config.github.client_secret = "gh-client-secret".to_string();
    config.github.access_token = "gh-s3cr3t-token".to_string();
    config.gitlab.access_token = "gl-s3cr3t-token".to_string();
    config.gitlab.private_token = "glpat-s3cr3t".to_string();
    config
}

fn assert_redacted(text: &str) {
    for secret in SECRETS {
        assert!(!text.contains(secret), "{secret} leaked into: {text}");
    }
}

#[tokio::test]
async fn github_request_logs_url_without_credentials() {
    let (logs, _guard) = capture_logs();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("access_token", "gh-s3cr3t-token"))
        .and(query_param("client_secret", "gh-client-secret"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let registry = registry(with_credentials(mock_config(&server.uri())));
    let provider = registry
        .build(ProviderKind::GitHub, "jupyterhub/binderhub/main")
        .unwrap();
    let err = provider.resolve_ref().await.unwrap_err();

    assert_redacted(&err.to_string());
    let logs = logs.contents();
    assert!(logs.contains("Fetching"), "no fetch event in: {logs}");
    assert!(logs.contains("/repos/jupyterhub/binderhub/commits/main"));
    assert_redacted(&logs);
}

#[tokio::test]
async fn gist_request_logs_url_without_credentials() {
    let (logs, _guard) = capture_logs();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("access_token", "gh-s3cr3t-token"))
        .respond_with(with_rate_limit(
            ResponseTemplate::new(200).set_body_json(json!({
                "public": true,
                "history": [{"version": SHA_A}]
            })),
            5,
            60,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let registry = registry(with_credentials(mock_config(&server.uri())));
    let provider = registry
        .build(ProviderKind::Gist, "mariusvniekerk/8a658f7f63b13768d1e75fa2464f5092")
        .unwrap();
    assert_eq!(provider.resolve_ref().await.unwrap().as_deref(), Some(SHA_A));

    let logs = logs.contents();
    assert!(logs.contains("/gists/8a658f7f63b13768d1e75fa2464f5092"));
    assert!(logs.contains("GitHub rate limit remaining 5/60"));
    assert_redacted(&logs);
}

#[tokio::test]
async fn gitlab_request_logs_url_without_credentials() {
    let (logs, _guard) = capture_logs();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("private_token", "glpat-s3cr3t"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let registry = registry(with_credentials(mock_config(&server.uri())));
    let provider = registry
        .build(ProviderKind::GitLab, "group%2Frepo/main")
        .unwrap();
    let err = provider.resolve_ref().await.unwrap_err();

    assert_redacted(&err.to_string());
    let logs = logs.contents();
    assert!(logs.contains("/api/v4/projects/group%2Frepo/repository/commits/main"));
    assert_redacted(&logs);
}

#[tokio::test]
async fn unreachable_host_errors_omit_credentials() {
    let config = with_credentials(mock_config("http://127.0.0.1:1"));
    let registry = registry(config);

    for (kind, spec) in [
        (ProviderKind::GitHub, "a/b/main"),
        (ProviderKind::Gist, "a/abc123"),
        (ProviderKind::GitLab, "a%2Fb/main"),
    ] {
        let provider = registry.build(kind, spec).unwrap();
        let err = provider.resolve_ref().await.unwrap_err();
        assert!(err.is_transport(), "{kind}: {err}");
        assert_redacted(&err.to_string());
        assert_redacted(&format!("{err:?}"));
        assert_redacted(&format!("{:#}", anyhow::Error::from(err)));
    }
}
