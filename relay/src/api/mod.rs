use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Request},
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub mod movies;
pub mod tmdb;

pub const LIVENESS_MESSAGE: &str = "Movie API running...";

/// Build the full HTTP surface with its middleware stack.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { LIVENESS_MESSAGE }))
        .route("/healthz", get(|| async { "ok" }))
        .merge(movie_routes())
        .merge(tmdb_routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(request_id_middleware))
}

/// Local collection: list, create, delete-by-id.
fn movie_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/movies",
            get(movies::list_movies).post(movies::create_movie),
        )
        .route("/api/movies/:id", delete(movies::delete_movie))
}

/// Read-only TMDB relay.
fn tmdb_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tmdb/trending", get(tmdb::trending))
        .route("/tmdb/popular", get(tmdb::popular))
        .route("/tmdb/top-rated", get(tmdb::top_rated))
        .route("/tmdb/search/:query", get(tmdb::search))
        .route("/tmdb/category/:genre", get(tmdb::category))
}

/// Middleware: injects a unique X-Request-Id into every response.
/// This allows clients to correlate errors with relay logs.
async fn request_id_middleware(req: Request, next: Next) -> Response {
    let req_id = uuid::Uuid::new_v4().to_string();
    let mut resp = next.run(req).await;
    if let Ok(val) = HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}
