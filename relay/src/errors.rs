use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::proxy::genre::UnknownGenre;
use crate::proxy::upstream::UpstreamError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    InvalidGenre(#[from] UnknownGenre),

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),

    #[error("{endpoint} upstream error: {source}")]
    Upstream {
        endpoint: &'static str,
        source: UpstreamError,
        /// Extra human-readable `message` field on the response.
        message: Option<&'static str>,
    },
}

impl AppError {
    pub fn upstream(endpoint: &'static str, source: UpstreamError) -> Self {
        AppError::Upstream {
            endpoint,
            source,
            message: None,
        }
    }

    pub fn with_message(mut self, msg: &'static str) -> Self {
        if let AppError::Upstream { message, .. } = &mut self {
            *message = Some(msg);
        }
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::InvalidGenre(UnknownGenre(genre)) => {
                tracing::debug!("rejected unknown genre '{}'", genre);
                (StatusCode::BAD_REQUEST, json!({ "error": "Invalid genre" }))
            }
            AppError::InvalidBody(msg) => {
                tracing::warn!("Invalid request body: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": msg }))
            }
            AppError::Storage(e) => {
                tracing::error!("Storage error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": format!("{:#}", e) }),
                )
            }
            AppError::Upstream {
                endpoint,
                source,
                message,
            } => {
                let detail = source.detail();
                tracing::error!("{} Error: {}", endpoint, detail);
                let body = match message {
                    Some(m) => json!({ "error": detail, "message": m }),
                    None => json!({ "error": detail }),
                };
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
        };

        (status, Json(body)).into_response()
    }
}
