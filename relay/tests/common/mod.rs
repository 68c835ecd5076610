#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, Response};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use relay::config::TmdbConfig;
use relay::proxy::auth::UpstreamAuth;
use relay::proxy::upstream::TmdbClient;
use relay::store::memory::MemoryStore;
use relay::AppState;

/// Nothing listens here; used when a test never reaches the upstream.
pub const UNUSED_UPSTREAM: &str = "http://127.0.0.1:9";

/// Upstream config with a short per-attempt timeout and millisecond backoff
/// so retry paths finish quickly.
pub fn fast_tmdb_config(upstream: &str, auth: Option<UpstreamAuth>) -> TmdbConfig {
    let mut cfg = TmdbConfig::new(upstream, auth).unwrap();
    cfg.timeout = Duration::from_millis(300);
    cfg.retry.backoff_unit = Duration::from_millis(10);
    cfg
}

/// Build the full application router, backed by an empty in-memory store.
pub fn build_test_app(cfg: TmdbConfig) -> Router {
    let state = AppState {
        movies: Box::new(MemoryStore::new()),
        tmdb: TmdbClient::new(&cfg).unwrap(),
    };
    relay::api::app(Arc::new(state))
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn send(app: Router, method: Method, uri: &str, body: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(b) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(b.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
