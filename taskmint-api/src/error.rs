//! Error types for taskmint-api
//!
//! Every failure reaching the HTTP boundary becomes an [`ApiError`] and is
//! rendered as `{"error": "<message>"}`. Server-side failures answer with a
//! fixed message; their cause only goes to the log.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::extraction::ExtractionError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing or rejected credentials (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found or not owned by the caller (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Conflict (409), e.g. email already registered
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Model pipeline failure (500)
    #[error("Extraction failed: {0}")]
    Extraction(ExtractionError),

    /// Persistence failure (500)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Server-side failure with a fixed public message (500)
    #[error("{message}: {detail}")]
    Internal {
        message: &'static str,
        detail: String,
    },
}

impl ApiError {
    /// Replace the generic 500 message with an operation-specific one
    pub fn with_context(self, message: &'static str) -> Self {
        match self {
            ApiError::Storage(detail) => ApiError::Internal { message, detail },
            ApiError::Extraction(err) => ApiError::Internal {
                message,
                detail: err.to_string(),
            },
            other => other,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Extraction(err) => {
                tracing::error!(error = %err, "Task generation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to generate tasks".to_string(),
                )
            }
            ApiError::Storage(detail) => {
                tracing::error!(error = %detail, "Storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::Internal { message, detail } => {
                tracing::error!(error = %detail, "{}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, message.to_string())
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

impl From<taskmint_common::Error> for ApiError {
    fn from(err: taskmint_common::Error) -> Self {
        use taskmint_common::Error;
        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            other => ApiError::Storage(other.to_string()),
        }
    }
}

impl From<ExtractionError> for ApiError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::EmptyTranscript => ApiError::BadRequest(err.to_string()),
            other => ApiError::Extraction(other),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken | AuthError::InvalidToken | AuthError::BadCredentials => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthError::Hashing(detail) | AuthError::Signing(detail) => ApiError::Internal {
                message: "Authentication failed",
                detail,
            },
            AuthError::InvalidLifetime(_) => ApiError::Internal {
                message: "Authentication failed",
                detail: err.to_string(),
            },
        }
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
