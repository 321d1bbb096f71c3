//! HTTP API handlers for taskmint-api

pub mod accounts;
pub mod auth;
pub mod health;
pub mod tasks;

pub use auth::auth_middleware;
pub use health::health_routes;

use axum::extract::rejection::JsonRejection;

use crate::error::ApiError;

/// Malformed or mistyped JSON bodies are a 400 with the usual error shape
pub(crate) fn json_rejection(rejection: JsonRejection) -> ApiError {
    ApiError::BadRequest(rejection.body_text())
}
