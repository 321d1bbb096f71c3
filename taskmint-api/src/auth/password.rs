//! Argon2id password hashing (PHC string format)

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use std::sync::OnceLock;
use tracing::warn;

use super::AuthError;

const DUMMY_PASSWORD: &str = "taskmint-unknown-account";

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// False for a wrong password or an unparseable stored hash
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!(error = %e, "Stored password hash is not a valid PHC string");
            false
        }
    }
}

/// Run a full verification against a throwaway hash
///
/// Used when no account matches, so an unknown email costs the same argon2
/// work as a wrong password. Always false.
pub fn verify_against_dummy(password: &str) -> bool {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

    if let Some(hash) = DUMMY_HASH.get_or_init(|| hash_password(DUMMY_PASSWORD).ok()) {
        let _ = verify_password(password, hash);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("battery staple", &hash));
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("same password").unwrap();
        let b = hash_password("same password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_dummy_verification_never_succeeds() {
        assert!(!verify_against_dummy("correct horse"));
        assert!(!verify_against_dummy(DUMMY_PASSWORD));
    }

    #[test]
    fn test_invalid_stored_hash() {
        assert!(!verify_password("anything", "plaintext"));
    }
}
