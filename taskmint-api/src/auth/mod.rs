//! Identity: password hashing and bearer-token issuance/verification
//!
//! Pure functions only. The axum middleware that applies them lives in
//! `crate::api::auth`.

pub mod jwt;
pub mod password;

pub use jwt::{Claims, TokenKeys};
pub use password::{hash_password, verify_against_dummy, verify_password};

use thiserror::Error;
use uuid::Uuid;

/// Authenticated caller attached to each protected request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

/// Authentication failures
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No authentication token provided")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid email or password")]
    BadCredentials,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Invalid token lifetime: {0} hours")]
    InvalidLifetime(u64),
}
