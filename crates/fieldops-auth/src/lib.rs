//! Credential verification and session tokens for fieldops

pub mod jwt;
pub mod password;

pub use jwt::{JwtClaims, JwtError, JwtValidator, TokenIssuer};
pub use password::{hash_password, verify_credentials, verify_password, PasswordError};
