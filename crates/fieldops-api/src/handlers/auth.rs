//! Login, logout and the current identity

use axum::{extract::State, Extension, Json};
use fieldops_auth::verify_credentials;
use fieldops_core::Role;
use fieldops_db::entities::{team, user};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::middleware::AuthUser;
use crate::models::*;
use crate::AppState;

/// Exchange email and password for a session token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Email or password missing", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let email = req.email.as_deref().map(str::trim).unwrap_or_default();
    let password = req.password.as_deref().unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(&state.db)
        .await?;

    let verified = verify_credentials(password, user.as_ref().map(|u| u.password_hash.as_str()))?;
    let user = match user {
        Some(user) if verified => user,
        _ => {
            warn!(email = %email, "Rejected login attempt");
            return Err(ApiError::Unauthenticated("Invalid credentials".to_string()));
        }
    };

    let role: Role = user.role.into();
    let (token, claims) = state
        .tokens
        .issue(&user.id.to_string(), role.as_str())
        .map_err(|e| ApiError::Internal(format!("Failed to issue token: {}", e)))?;

    info!(user_id = %user.id, %role, "User logged in");

    Ok(Json(LoginResponse {
        user: SessionUser::from(&user),
        token,
        expires_at: claims.expires_at(),
    }))
}

/// Acknowledge a logout
///
/// Tokens are stateless; the client discards its copy.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse::new("Logged out successfully"))
}

/// The identity behind the presented token
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current identity", body = User),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Identity no longer exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<User>> {
    let (user, team) = user::Entity::find_by_id(auth.user_id)
        .find_also_related(team::Entity)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    Ok(Json(User::from_model(&user, team.as_ref())))
}
