//! Identity management

use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use fieldops_auth::hash_password;
use fieldops_core::{authorize, can, Action, Resource, Role};
use fieldops_db::entities::{team, user, visit};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, LoaderTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{caller, required};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::AuthUser;
use crate::models::*;
use crate::AppState;

async fn ensure_email_free(
    db: &DatabaseConnection,
    email: &str,
    except: Option<Uuid>,
) -> ApiResult<()> {
    let mut query = user::Entity::find().filter(user::Column::Email.eq(email));
    if let Some(id) = except {
        query = query.filter(user::Column::Id.ne(id));
    }

    if query.count(db).await? > 0 {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }
    Ok(())
}

async fn find_team(db: &DatabaseConnection, team_id: Uuid) -> ApiResult<team::Model> {
    team::Entity::find_by_id(team_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Team"))
}

/// List identities
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All identities", body = Vec<User>),
        (status = 403, description = "Administrators only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<Vec<User>>> {
    let caller = caller(&state, &auth).await?;
    authorize(&caller, Action::ListUsers, Resource::None)?;

    let users = user::Entity::find()
        .order_by_asc(user::Column::Name)
        .all(&state.db)
        .await?;
    let teams = users.load_one(team::Entity, &state.db).await?;

    debug!("Listing {} users", users.len());

    Ok(Json(
        users
            .iter()
            .zip(teams.iter())
            .map(|(user, team)| User::from_model(user, team.as_ref()))
            .collect(),
    ))
}

/// Get one identity
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "Identity ID")),
    responses(
        (status = 200, description = "Identity", body = User),
        (status = 403, description = "Neither the identity itself nor an administrator", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<User>> {
    let caller = caller(&state, &auth).await?;
    authorize(&caller, Action::ReadUser, Resource::Identity(id))?;

    let (user, team) = user::Entity::find_by_id(id)
        .find_also_related(team::Entity)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    Ok(Json(User::from_model(&user, team.as_ref())))
}

/// Create an identity
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Identity created", body = User),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Administrators only", body = ErrorResponse),
        (status = 404, description = "Team not found", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let caller = caller(&state, &auth).await?;
    authorize(&caller, Action::CreateUser, Resource::None)?;

    let name = required("Name", &req.name)?;
    let email = required("Email", &req.email)?;
    if req.password.is_empty() {
        return Err(ApiError::Validation("Password is required".to_string()));
    }

    ensure_email_free(&state.db, &email, None).await?;

    let team = match req.team_id {
        Some(team_id) => Some(find_team(&state.db, team_id).await?),
        None => None,
    };

    let role = req.role.unwrap_or(Role::FieldTeam);
    let now = Utc::now();
    let created = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        email: Set(email),
        password_hash: Set(hash_password(&req.password)?),
        role: Set(role.into()),
        team_id: Set(team.as_ref().map(|t| t.id)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    info!(user_id = %created.id, %role, "User created");

    Ok((
        StatusCode::CREATED,
        Json(User::from_model(&created, team.as_ref())),
    ))
}

/// Update an identity
///
/// `role` may only be supplied by an administrator. A `teamId` from anyone
/// else is ignored.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "Identity ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Identity updated", body = User),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "Identity or team not found", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    let caller = caller(&state, &auth).await?;
    authorize(&caller, Action::UpdateUser, Resource::Identity(id))?;
    if req.role.is_some() {
        authorize(&caller, Action::ChangeUserRole, Resource::Identity(id))?;
    }

    let may_assign_team = can(&caller, Action::AssignUserTeam, Resource::Identity(id)).is_allowed();
    let team_change = match req.team_id {
        Some(team_id) if may_assign_team => Some(team_id),
        Some(_) => {
            debug!(user_id = %caller.id, "Ignoring team change from non-administrator");
            None
        }
        None => None,
    };

    let existing = user::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    let mut active: user::ActiveModel = existing.into();

    if let Some(name) = &req.name {
        active.name = Set(required("Name", name)?);
    }
    if let Some(email) = &req.email {
        let email = required("Email", email)?;
        ensure_email_free(&state.db, &email, Some(id)).await?;
        active.email = Set(email);
    }
    if let Some(password) = &req.password {
        if password.is_empty() {
            return Err(ApiError::Validation("Password is required".to_string()));
        }
        active.password_hash = Set(hash_password(password)?);
    }
    if let Some(role) = req.role {
        active.role = Set(role.into());
    }
    if let Some(team_id) = team_change {
        if let Some(team_id) = team_id {
            find_team(&state.db, team_id).await?;
        }
        active.team_id = Set(team_id);
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(&state.db).await?;
    let team = updated.find_related(team::Entity).one(&state.db).await?;

    info!(user_id = %updated.id, "User updated");

    Ok(Json(User::from_model(&updated, team.as_ref())))
}

/// Delete an identity
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "Identity ID")),
    responses(
        (status = 200, description = "Identity deleted", body = MessageResponse),
        (status = 403, description = "Administrators only", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 409, description = "Identity created visits that still exist", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let caller = caller(&state, &auth).await?;
    authorize(&caller, Action::DeleteUser, Resource::Identity(id))?;

    let existing = user::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    let created_visits = visit::Entity::find()
        .filter(visit::Column::CreatedById.eq(id))
        .count(&state.db)
        .await?;
    if created_visits > 0 {
        return Err(ApiError::Conflict(format!(
            "User created {} visit(s) and cannot be deleted",
            created_visits
        )));
    }

    existing.delete(&state.db).await?;
    info!(user_id = %id, "User deleted");

    Ok(Json(MessageResponse::new("User deleted successfully")))
}
