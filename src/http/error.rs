//! Boundary error envelope.
//!
//! Every failure leaving a handler becomes `{"error": "..."}` with the
//! matching status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or empty required input.
    #[error("{0}")]
    Validation(&'static str),

    /// `/fetch` could not fetch or transform the page.
    #[error("Failed to fetch content: {0}")]
    Content(String),

    /// `/proxy-resource` could not fetch the resource.
    #[error("Failed to fetch resource")]
    Resource,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Content(_) | ApiError::Resource => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
