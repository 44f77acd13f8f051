//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use personachat_types::error::ConversationError;

/// Message shown to clients when the completion engine fails.
pub const COMPLETION_FAILED_MESSAGE: &str = "Error processing your request.";

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Failure surfaced by the conversation service.
    Conversation(ConversationError),
    /// Missing or malformed caller identity.
    Unauthorized(String),
    /// Validation error.
    Validation(String),
    /// Unexpected failure outside the conversation service.
    Internal(String),
}

impl From<ConversationError> for AppError {
    fn from(e: ConversationError) -> Self {
        AppError::Conversation(e)
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Conversation(ConversationError::StorageUnavailable(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "STORAGE_UNAVAILABLE",
                "Storage is temporarily unavailable.".to_string(),
            ),
            AppError::Conversation(ConversationError::CompletionFailed(_)) => (
                StatusCode::BAD_GATEWAY,
                "COMPLETION_FAILED",
                COMPLETION_FAILED_MESSAGE.to_string(),
            ),
            AppError::Conversation(ConversationError::InvalidRequest(reason)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", reason.clone())
            }
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error.".to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        // Internal detail goes to the log, never to the client.
        match &self {
            AppError::Conversation(e) => tracing::warn!(code, error = %e, "request failed"),
            AppError::Internal(detail) => tracing::error!(code, %detail, "request failed"),
            AppError::Unauthorized(_) | AppError::Validation(_) => {}
        }

        let body = json!({
            "data": null,
            "meta": {
                "request_id": "",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
