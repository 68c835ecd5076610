use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::store::MovieRecord;
use crate::AppState;

/// GET /api/movies — every stored record
pub async fn list_movies(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MovieRecord>>, AppError> {
    let movies = state.movies.list().await?;
    Ok(Json(movies))
}

/// POST /api/movies — store the body as-is and echo it back with its `_id`
pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<MovieRecord>, AppError> {
    // Bodies sent without a JSON content type are not parsed; they store
    // an empty record.
    let mut fields = match payload {
        Ok(Json(fields)) => fields,
        Err(JsonRejection::MissingJsonContentType(_)) => Map::new(),
        Err(rejection) => return Err(AppError::InvalidBody(rejection.body_text())),
    };

    // Ids are always generated by the store.
    fields.remove("_id");

    let movie = state.movies.create(fields).await?;
    tracing::debug!("stored movie {}", movie.id);
    Ok(Json(movie))
}

/// DELETE /api/movies/:id — succeeds whether or not the record existed
pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let movie_id =
        Uuid::parse_str(&id).map_err(|e| anyhow!("invalid movie id '{}': {}", id, e))?;

    if !state.movies.delete(movie_id).await? {
        tracing::debug!("delete of unknown movie {}", movie_id);
    }

    Ok(Json(json!({ "message": "Movie deleted" })))
}
