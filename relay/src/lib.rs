//! Movie relay — library crate shared by the `movie-relay` binary and
//! the integration tests in `tests/`.

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod proxy;
pub mod store;

use proxy::upstream::TmdbClient;
use store::MovieStore;

/// Shared application state passed to handlers.
/// Built once at startup and read-only afterwards.
pub struct AppState {
    pub movies: Box<dyn MovieStore>,
    pub tmdb: TmdbClient,
}
