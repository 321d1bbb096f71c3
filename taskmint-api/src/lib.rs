//! taskmint-api library - meeting transcript to task list service
//!
//! Protected routes require a bearer token; `/health` and the account
//! entry points are public.

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod api;
pub mod auth;
pub mod db;
pub mod error;
pub mod extraction;
pub mod services;

use auth::TokenKeys;
use extraction::LanguageModel;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Language model used for transcript extraction
    pub llm: Arc<dyn LanguageModel>,
    /// Bearer token signing and verification keys
    pub tokens: Arc<TokenKeys>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, llm: Arc<dyn LanguageModel>, tokens: TokenKeys) -> Self {
        Self {
            db,
            llm,
            tokens: Arc::new(tokens),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, patch, post};

    // Protected routes (require authentication)
    let protected = Router::new()
        .route(
            "/tasks",
            get(api::tasks::list_tasks).delete(api::tasks::delete_all_tasks),
        )
        .route("/tasks/generate", post(api::tasks::generate_tasks))
        .route("/tasks/stats", get(api::tasks::task_stats))
        .route("/tasks/export", get(api::tasks::export_tasks))
        .route(
            "/tasks/:id",
            patch(api::tasks::update_task).delete(api::tasks::delete_task),
        )
        .route("/auth/me", get(api::accounts::me))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    // Public routes (no authentication)
    let public = Router::new()
        .route("/auth/register", post(api::accounts::register))
        .route("/auth/login", post(api::accounts::login))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy for a separately hosted front end
///
/// With no configured origin any origin is allowed.
pub fn cors_layer(allowed_origin: Option<&str>) -> taskmint_common::Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_DISPOSITION]);

    match allowed_origin {
        Some(origin) => {
            let value = HeaderValue::from_str(origin).map_err(|e| {
                taskmint_common::Error::Config(format!("Invalid CORS origin '{}': {}", origin, e))
            })?;
            Ok(layer.allow_origin(value))
        }
        None => Ok(layer.allow_origin(Any)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_accepts_origin() {
        assert!(cors_layer(Some("http://localhost:3000")).is_ok());
        assert!(cors_layer(None).is_ok());
    }

    #[test]
    fn test_cors_layer_rejects_invalid_origin() {
        let result = cors_layer(Some("http://bad\norigin"));
        assert!(matches!(result, Err(taskmint_common::Error::Config(_))));
    }
}
