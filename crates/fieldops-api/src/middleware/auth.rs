//! Bearer token authentication middleware
//!
//! Validates the `Authorization: Bearer <token>` header of protected routes
//! and makes the caller available to handlers via Axum's `Extension`.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use fieldops_auth::JwtValidator;
use fieldops_core::Role;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;

/// Authenticated caller extracted from the session token
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

/// JWT validation state shared across middleware instances
#[derive(Clone)]
pub struct JwtState {
    pub validator: Arc<JwtValidator>,
}

impl JwtState {
    pub fn new(validator: JwtValidator) -> Self {
        Self {
            validator: Arc::new(validator),
        }
    }
}

/// Reject requests without a valid session token
///
/// # Errors
/// Returns 401 Unauthorized if:
/// - The Authorization header is missing or not a Bearer token
/// - The token signature, issuer or audience does not check out
/// - The token is expired
/// - The subject is not a UUID or the role claim is unknown
pub async fn require_auth(
    State(state): State<Arc<JwtState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::Unauthenticated("Missing authentication token".to_string()))?;

    // Auth scheme names are case-insensitive
    let token = auth_header
        .split_once(' ')
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token)
        .ok_or_else(|| {
            ApiError::Unauthenticated(
                "Invalid Authorization header format. Expected 'Bearer <token>'".to_string(),
            )
        })?;

    let claims = state.validator.validate(token.trim())?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::Unauthenticated("Token subject is not a valid id".to_string()))?;
    let role: Role = claims
        .role
        .parse()
        .map_err(|_| ApiError::Unauthenticated("Token carries an unknown role".to_string()))?;

    debug!(%user_id, %role, "Authenticated request");
    request.extensions_mut().insert(AuthUser { user_id, role });

    Ok(next.run(request).await)
}
