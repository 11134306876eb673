//! HTTP handlers, one module per resource

pub mod auth;
pub mod clients;
pub mod health;
pub mod reports;
pub mod services;
pub mod teams;
pub mod users;
pub mod visits;

use fieldops_core::Caller;
use fieldops_db::membership;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::AppState;

/// Resolve the authenticated user into a policy [`Caller`]
///
/// Team membership is looked up per request so reassignments take effect
/// without a new login.
pub(crate) async fn caller(state: &AppState, auth: &AuthUser) -> Result<Caller, ApiError> {
    let team_id = membership::team_of(&state.db, auth.user_id).await?;
    Ok(Caller::new(auth.user_id, auth.role).with_team(team_id))
}

/// Trim a required text field, rejecting blanks
pub(crate) fn required(field: &str, value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}
