//! Application error type mapping chat errors to HTTP responses.
//!
//! Every error body is `{"error": "<message>"}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use kushlbot_types::error::{ChatError, RepositoryError};

/// Handler error wrapping a [`ChatError`].
#[derive(Debug)]
pub struct AppError(pub ChatError);

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError(e)
    }
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        AppError(ChatError::Storage(e))
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ChatError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ChatError::NotFound => StatusCode::NOT_FOUND,
            ChatError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ChatError::Upstream(_) | ChatError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self.0 {
            ChatError::InvalidInput(msg) => msg.clone(),
            ChatError::NotFound => "Chat not found".to_string(),
            ChatError::Timeout => "Request timed out. Please try again.".to_string(),
            ChatError::Upstream(msg) => msg.clone(),
            // Storage details stay in the logs.
            ChatError::Storage(e) => {
                tracing::error!(error = %e, "Storage failure while handling request");
                "Internal server error".to_string()
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
