//! Liveness plus a database round trip
//!
//! `/health` is public. It answers 503 when the store cannot serve a
//! trivial query.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::warn;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    pub database: &'static str,
}

async fn database_reachable(pool: &SqlitePool) -> bool {
    match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await {
        Ok(_) => true,
        Err(e) => {
            warn!(error = %e, "Health check query failed");
            false
        }
    }
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (code, status, database) = if database_reachable(&state.db).await {
        (StatusCode::OK, "ok", "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unavailable")
    };

    (
        code,
        Json(HealthResponse {
            status,
            module: "taskmint",
            version: env!("CARGO_PKG_VERSION"),
            database,
        }),
    )
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
