//! Bearer token middleware
//!
//! Verifies `Authorization: Bearer <jwt>` and attaches the caller as an
//! [`AuthUser`] request extension. Applied to protected routes only.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::auth::jwt::extract_bearer_token;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::AppState;

/// Authentication middleware
///
/// Returns 401 Unauthorized when the token is missing, malformed, badly
/// signed or expired.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let user: AuthUser = extract_bearer_token(header)
        .and_then(|token| state.tokens.verify(token))
        .map_err(|e| {
            debug!(path = %request.uri().path(), error = %e, "Rejected request");
            ApiError::from(e)
        })?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
