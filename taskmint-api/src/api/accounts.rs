//! Account endpoints: register, login, current user

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use super::json_rejection;
use crate::auth::{hash_password, verify_against_dummy, verify_password, AuthError, AuthUser};
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use taskmint_common::User;

const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token plus the account it was issued for
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: User,
}

fn validate_registration(req: &RegisterRequest) -> ApiResult<()> {
    if !req.email.trim().contains('@') {
        return Err(ApiError::BadRequest("A valid email is required".to_string()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Name is required".to_string()));
    }
    Ok(())
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let Json(req) = body.map_err(json_rejection)?;
    validate_registration(&req)?;

    let password_hash = hash_password(&req.password)?;
    let user = db::users::create_user(&state.db, &req.email, &password_hash, &req.name).await?;
    let token = state.tokens.issue(user.id, &user.email)?;

    info!(user = %user.id, "Registered account");

    Ok((StatusCode::CREATED, Json(SessionResponse { token, user })))
}

/// POST /auth/login
///
/// Unknown email and wrong password give the same 401 after the same
/// amount of argon2 work.
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<SessionResponse>> {
    let Json(req) = body.map_err(json_rejection)?;

    let Some((user, password_hash)) = db::users::find_credentials(&state.db, &req.email).await?
    else {
        verify_against_dummy(&req.password);
        return Err(AuthError::BadCredentials.into());
    };

    if !verify_password(&req.password, &password_hash) {
        return Err(AuthError::BadCredentials.into());
    }

    let token = state.tokens.issue(user.id, &user.email)?;
    info!(user = %user.id, "Logged in");

    Ok(Json(SessionResponse { token, user }))
}

/// GET /auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<Value>> {
    let user = db::users::get_user(&state.db, caller.id)
        .await
        .map_err(|e| ApiError::from(e).with_context("Failed to fetch user"))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({ "user": user })))
}
