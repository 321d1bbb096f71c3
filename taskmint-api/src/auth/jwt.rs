//! HS256 bearer tokens

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::{AuthError, AuthUser};

const AUTHORIZATION_BEARER_PREFIX: &str = "Bearer ";
const MAX_TOKEN_LENGTH: usize = 4096;

/// Token claims: `sub` is the user id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signing and verification keys derived from the configured secret
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    /// Fails when the lifetime does not fit a signed duration
    pub fn new(secret: &str, ttl_hours: u64) -> Result<Self, AuthError> {
        let ttl = i64::try_from(ttl_hours)
            .ok()
            .and_then(Duration::try_hours)
            .filter(|ttl| *ttl > Duration::zero())
            .ok_or(AuthError::InvalidLifetime(ttl_hours))?;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }

    /// Issue a token valid from now for the configured lifetime
    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<String, AuthError> {
        self.issue_at(user_id, email, Utc::now())
    }

    /// Issue a token as if the current time were `issued_at`
    pub fn issue_at(
        &self,
        user_id: Uuid,
        email: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::Signing("token expiry out of range".to_string()))?;

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Verify signature and expiry, returning the caller identity
    pub fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "Rejected bearer token");
            AuthError::InvalidToken
        })?;

        let id = Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::InvalidToken)?;

        Ok(AuthUser {
            id,
            email: data.claims.email,
        })
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn extract_bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingToken)?;
    let token = header
        .strip_prefix(AUTHORIZATION_BEARER_PREFIX)
        .ok_or(AuthError::InvalidToken)?
        .trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    if token.len() > MAX_TOKEN_LENGTH {
        return Err(AuthError::InvalidToken);
    }
    Ok(token)
}
