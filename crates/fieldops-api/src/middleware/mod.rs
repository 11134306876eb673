//! API Middleware

pub mod auth;

pub use auth::{require_auth, AuthUser, JwtState};
