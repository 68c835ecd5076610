use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::errors::AppError;
use crate::proxy::genre::Genre;
use crate::AppState;

/// GET /tmdb/trending
pub async fn trending(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let movies = state.tmdb.trending().await.map_err(|e| {
        AppError::upstream("Trending", e).with_message("Failed to fetch trending movies")
    })?;
    Ok(Json(movies))
}

/// GET /tmdb/popular
pub async fn popular(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let movies = state.tmdb.popular().await.map_err(|e| {
        AppError::upstream("Popular", e).with_message("Failed to fetch popular movies")
    })?;
    Ok(Json(movies))
}

/// GET /tmdb/top-rated
pub async fn top_rated(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let movies = state.tmdb.top_rated().await.map_err(|e| {
        AppError::upstream("Top Rated", e).with_message("Failed to fetch top rated movies")
    })?;
    Ok(Json(movies))
}

/// GET /tmdb/search/:query
pub async fn search(
    State(state): State<Arc<AppState>>,
    Path(query): Path<String>,
) -> Result<Json<Value>, AppError> {
    let movies = state
        .tmdb
        .search(&query)
        .await
        .map_err(|e| AppError::upstream("Search", e))?;
    Ok(Json(movies))
}

/// GET /tmdb/category/:genre — the genre is validated before any upstream call
pub async fn category(
    State(state): State<Arc<AppState>>,
    Path(genre): Path<String>,
) -> Result<Json<Value>, AppError> {
    let genre: Genre = genre.parse()?;
    let movies = state
        .tmdb
        .discover(genre)
        .await
        .map_err(|e| AppError::upstream("Category", e))?;
    Ok(Json(movies))
}
