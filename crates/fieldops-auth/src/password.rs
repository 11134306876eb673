//! Argon2id password storage

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    #[error("Failed to verify password: {0}")]
    VerificationFailed(String),

    #[error("Invalid password hash format: {0}")]
    InvalidHashFormat(String),
}

/// Hash a password into a PHC string (`$argon2id$v=19$...`)
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))
}

/// Check a password against a stored PHC string
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed =
        PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHashFormat(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerificationFailed(e.to_string())),
    }
}

/// Check a login attempt
///
/// When no identity matched the email, the password is still verified
/// against a throwaway hash so unknown and known emails take the same time.
pub fn verify_credentials(
    password: &str,
    stored_hash: Option<&str>,
) -> Result<bool, PasswordError> {
    match stored_hash {
        Some(hash) => verify_password(password, hash),
        None => {
            if let Some(hash) = placeholder_hash() {
                let _ = verify_password(password, hash);
            }
            Ok(false)
        }
    }
}

fn placeholder_hash() -> Option<&'static str> {
    static PLACEHOLDER: OnceLock<Option<String>> = OnceLock::new();

    PLACEHOLDER
        .get_or_init(|| match hash_password("fieldops-placeholder") {
            Ok(hash) => Some(hash),
            Err(e) => {
                error!("Failed to prepare placeholder hash: {}", e);
                None
            }
        })
        .as_deref()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_argon2id_phc() {
        let hash = hash_password("senha123").unwrap();
        assert!(hash.starts_with("$argon2id$v=19$"));
    }

    #[test]
    fn test_verify_matches_only_hashed_password() {
        let hash = hash_password("senha123").unwrap();
        assert!(verify_password("senha123", &hash).unwrap());
        assert!(!verify_password("Senha123", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(matches!(
            verify_password("anything", "plaintext-password"),
            Err(PasswordError::InvalidHashFormat(_))
        ));
    }

    #[test]
    fn test_verify_credentials_unknown_identity() {
        assert!(!verify_credentials("senha123", None).unwrap());
    }

    #[test]
    fn test_verify_credentials_known_identity() {
        let hash = hash_password("senha123").unwrap();
        assert!(verify_credentials("senha123", Some(&hash)).unwrap());
        assert!(!verify_credentials("wrong", Some(&hash)).unwrap());
    }
}
