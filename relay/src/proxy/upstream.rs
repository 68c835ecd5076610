/// HTTP client for the TMDB v3 API.
/// Injects credentials, retries transient failures and shapes errors.
use anyhow::Context;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde_json::Value;

use super::auth::UpstreamAuth;
use super::genre::Genre;
use super::retry::{robust_request, RetryPolicy};
use crate::config::TmdbConfig;

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// Upstream answered with a non-success status; `body` is what it sent.
    #[error("upstream returned {status}")]
    Status { status: StatusCode, body: Value },

    #[error("{0}")]
    Transport(String),

    #[error("upstream response did not contain results")]
    MissingResults,

    #[error("error decoding response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl UpstreamError {
    /// The value surfaced to callers as the `error` field: the upstream's
    /// own error body when there is one, otherwise a message.
    pub fn detail(&self) -> Value {
        match self {
            UpstreamError::Status { body, .. } => body.clone(),
            other => Value::String(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        // The URL may carry the api_key query parameter.
        UpstreamError::Transport(error_chain(&e.without_url()))
    }
}

fn error_chain(e: &dyn std::error::Error) -> String {
    let mut msg = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        msg.push_str(": ");
        msg.push_str(&s.to_string());
        source = s.source();
    }
    msg
}

pub struct TmdbClient {
    client: Client,
    base_url: String,
    auth: Option<UpstreamAuth>,
    retry: RetryPolicy,
}

impl TmdbClient {
    pub fn new(cfg: &TmdbConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .use_rustls_tls()
            .default_headers(headers)
            .timeout(cfg.timeout) // per attempt
            .build()
            .context("failed to build HTTP client")?;

        match &cfg.auth {
            Some(auth) => tracing::info!("Using TMDB {} authentication", auth.mode()),
            None => tracing::warn!(
                "TMDB_ACCESS_TOKEN or TMDB_KEY not set; upstream calls will fail authentication"
            ),
        }

        Ok(Self {
            client,
            base_url: cfg.base_url.as_str().trim_end_matches('/').to_string(),
            auth: cfg.auth.clone(),
            retry: cfg.retry.clone(),
        })
    }

    /// Weekly trending movies; `[]` when upstream omits `results`.
    pub async fn trending(&self) -> Result<Value, UpstreamError> {
        self.get_body("/trending/movie/week", &[])
            .await
            .map(|body| results_or_empty(&body))
    }

    pub async fn popular(&self) -> Result<Value, UpstreamError> {
        self.get_body("/movie/popular", &[])
            .await
            .map(|body| results_or_empty(&body))
    }

    pub async fn top_rated(&self) -> Result<Value, UpstreamError> {
        self.get_body("/movie/top_rated", &[])
            .await
            .map(|body| results_or_empty(&body))
    }

    /// Title search. Unlike the listing calls, a body without `results`
    /// is an error.
    pub async fn search(&self, query: &str) -> Result<Value, UpstreamError> {
        let body = self
            .get_body("/search/movie", &[("query", query.to_string())])
            .await?;
        results(serde_json::from_slice(&body)?)
    }

    pub async fn discover(&self, genre: Genre) -> Result<Value, UpstreamError> {
        let body = self
            .get_body("/discover/movie", &[("with_genres", genre.code().to_string())])
            .await?;
        results(serde_json::from_slice(&body)?)
    }

    /// Fetch `path` and return the fully read body of a 2xx response.
    #[tracing::instrument(skip(self, query))]
    async fn get_body(&self, path: &str, query: &[(&str, String)]) -> Result<Bytes, UpstreamError> {
        let mut builder = self.client.get(format!("{}{}", self.base_url, path));
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(auth) = &self.auth {
            builder = auth.apply(builder);
        }
        let request = builder.build()?;

        let response = robust_request(&self.client, request, &self.retry).await?;
        let status = response.status;

        if !status.is_success() {
            tracing::debug!("upstream {} answered {}", path, status);
            return Err(UpstreamError::Status {
                status,
                body: error_body(status, &String::from_utf8_lossy(&response.body)),
            });
        }

        Ok(response.body)
    }
}

fn error_body(status: StatusCode, text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::String(format!(
            "request failed with status code {}",
            status.as_u16()
        ));
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Unparseable bodies count as bodies without `results`.
fn results_or_empty(body: &[u8]) -> Value {
    serde_json::from_slice(body)
        .map_err(UpstreamError::from)
        .and_then(results)
        .unwrap_or_else(|_| Value::Array(Vec::new()))
}

fn results(body: Value) -> Result<Value, UpstreamError> {
    match body {
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Null) | None => Err(UpstreamError::MissingResults),
            Some(v) => Ok(v),
        },
        _ => Err(UpstreamError::MissingResults),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, auth: Option<UpstreamAuth>) -> TmdbClient {
        let mut cfg = TmdbConfig::new(&server.uri(), auth).unwrap();
        cfg.retry.backoff_unit = Duration::from_millis(5);
        TmdbClient::new(&cfg).unwrap()
    }

    #[test]
    fn test_results_extraction() {
        assert_eq!(results_or_empty(br#"{"page": 1}"#), json!([]));
        assert_eq!(results_or_empty(br#"{"results": null}"#), json!([]));
        assert_eq!(results_or_empty(br#"{"results": [{"id": 1}]}"#), json!([{"id": 1}]));
        assert_eq!(results_or_empty(b"[1]"), json!([]));
        assert_eq!(results_or_empty(b"<html>maintenance</html>"), json!([]));
        assert_eq!(results_or_empty(b""), json!([]));
        assert!(matches!(results(json!({"page": 1})), Err(UpstreamError::MissingResults)));
    }

    #[test]
    fn test_error_body_shapes() {
        assert_eq!(
            error_body(StatusCode::UNAUTHORIZED, r#"{"status_message":"Invalid API key"}"#),
            json!({"status_message": "Invalid API key"})
        );
        assert_eq!(
            error_body(StatusCode::BAD_GATEWAY, "<html>oops</html>"),
            json!("<html>oops</html>")
        );
        assert_eq!(
            error_body(StatusCode::NOT_FOUND, ""),
            json!("request failed with status code 404")
        );
    }

    #[tokio::test]
    async fn test_bearer_token_sent_as_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/popular"))
            .and(header("authorization", "Bearer tok_123"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [{"id": 7}]})))
            .expect(1)
            .mount(&server)
            .await;

        let tmdb = client_for(&server, Some(UpstreamAuth::Bearer("tok_123".into())));
        assert_eq!(tmdb.popular().await.unwrap(), json!([{"id": 7}]));
    }

    #[tokio::test]
    async fn test_api_key_sent_as_query_param() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/movie"))
            .and(query_param("query", "blade runner"))
            .and(query_param("api_key", "k_456"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .expect(1)
            .mount(&server)
            .await;

        let tmdb = client_for(&server, Some(UpstreamAuth::ApiKey("k_456".into())));
        assert_eq!(tmdb.search("blade runner").await.unwrap(), json!([]));
    }

    #[tokio::test]
    async fn test_discover_uses_genre_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/discover/movie"))
            .and(query_param("with_genres", "10749"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [{"id": 3}]})))
            .expect(1)
            .mount(&server)
            .await;

        let tmdb = client_for(&server, None);
        assert_eq!(tmdb.discover(Genre::Romance).await.unwrap(), json!([{"id": 3}]));
    }

    #[tokio::test]
    async fn test_structured_error_is_not_retried_and_passed_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/trending/movie/week"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"status_code": 7, "status_message": "Invalid API key"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let tmdb = client_for(&server, Some(UpstreamAuth::ApiKey("bad".into())));
        let err = tmdb.trending().await.unwrap_err();
        assert_eq!(
            err.detail(),
            json!({"status_code": 7, "status_message": "Invalid API key"})
        );
    }

    #[tokio::test]
    async fn test_search_without_results_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/movie"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"page": 1})))
            .mount(&server)
            .await;

        let tmdb = client_for(&server, None);
        let err = tmdb.search("x").await.unwrap_err();
        assert!(matches!(err, UpstreamError::MissingResults));
        assert_eq!(err.detail(), json!("upstream response did not contain results"));
    }

    #[tokio::test]
    async fn test_transport_error_hides_api_key() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let mut cfg = TmdbConfig::new(
            &format!("http://127.0.0.1:{port}"),
            Some(UpstreamAuth::ApiKey("very_secret_key".into())),
        )
        .unwrap();
        cfg.retry.backoff_unit = Duration::from_millis(1);
        let tmdb = TmdbClient::new(&cfg).unwrap();

        let err = tmdb.popular().await.unwrap_err();
        assert!(matches!(err, UpstreamError::Transport(_)));
        let detail = err.detail();
        let msg = detail.as_str().unwrap();
        assert!(!msg.is_empty());
        assert!(!msg.contains("very_secret_key"));
    }

    /// Serves `stalls` connections that send headers plus a partial body and
    /// then go quiet, then answers normally. Returns the base URL and a
    /// connection counter.
    async fn stalling_upstream(stalls: usize) -> (String, Arc<AtomicUsize>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));
        let seen = connections.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let n = seen.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let _ = socket.read(&mut buf).await;
                    if n < stalls {
                        let _ = socket
                            .write_all(
                                b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 100\r\n\r\n{\"results\":[",
                            )
                            .await;
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    } else {
                        let body = r#"{"results":[{"id":550}]}"#;
                        let resp = format!(
                            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(resp.as_bytes()).await;
                    }
                });
            }
        });

        (format!("http://{addr}"), connections)
    }

    fn short_timeout_client(base_url: &str) -> TmdbClient {
        let mut cfg = TmdbConfig::new(base_url, None).unwrap();
        cfg.timeout = Duration::from_millis(300);
        cfg.retry.backoff_unit = Duration::from_millis(5);
        TmdbClient::new(&cfg).unwrap()
    }

    #[tokio::test]
    async fn test_body_stall_is_retried() {
        let (url, connections) = stalling_upstream(2).await;
        let tmdb = short_timeout_client(&url);

        let movies = tmdb.popular().await.expect("third attempt should succeed");
        assert_eq!(movies, json!([{"id": 550}]));
        assert_eq!(connections.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_body_stall_exhausts_retries() {
        let (url, connections) = stalling_upstream(usize::MAX).await;
        let tmdb = short_timeout_client(&url);

        let err = tmdb.search("alien").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Transport(_)));
        assert_eq!(connections.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_listing_with_non_json_body_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/top_rated"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let tmdb = client_for(&server, None);
        assert_eq!(tmdb.top_rated().await.unwrap(), json!([]));
    }

    #[tokio::test]
    async fn test_search_with_non_json_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/movie"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let tmdb = client_for(&server, None);
        let err = tmdb.search("alien").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Decode(_)));
        assert!(err.detail().as_str().unwrap().starts_with("error decoding response body"));
    }
}
