//! Teams and their members

use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use fieldops_core::{authorize, Action, Resource};
use fieldops_db::entities::{team, user, visit};
use fieldops_db::membership;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, LoaderTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::{caller, required};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::AuthUser;
use crate::models::*;
use crate::AppState;

async fn find_team(db: &DatabaseConnection, id: Uuid) -> ApiResult<team::Model> {
    team::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Team"))
}

async fn ensure_users_exist(db: &DatabaseConnection, member_ids: &[Uuid]) -> ApiResult<()> {
    let unknown = membership::unknown_users(db, member_ids).await?;
    match unknown.first() {
        Some(id) => Err(ApiError::NotFound(format!("User {} not found", id))),
        None => Ok(()),
    }
}

/// List teams with their members
#[utoipa::path(
    get,
    path = "/api/teams",
    responses(
        (status = 200, description = "All teams", body = Vec<Team>)
    ),
    security(("bearer_auth" = [])),
    tag = "teams"
)]
pub async fn list_teams(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<Vec<Team>>> {
    let caller = caller(&state, &auth).await?;
    authorize(&caller, Action::Read, Resource::None)?;

    let teams = team::Entity::find()
        .order_by_asc(team::Column::Name)
        .all(&state.db)
        .await?;
    let members = teams.load_many(user::Entity, &state.db).await?;

    Ok(Json(
        teams
            .iter()
            .zip(members.iter())
            .map(|(team, members)| Team::from_model(team, members))
            .collect(),
    ))
}

/// Get a team with members and visits
#[utoipa::path(
    get,
    path = "/api/teams/{id}",
    params(("id" = Uuid, Path, description = "Team ID")),
    responses(
        (status = 200, description = "Team", body = TeamDetail),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "teams"
)]
pub async fn get_team(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<TeamDetail>> {
    let caller = caller(&state, &auth).await?;
    authorize(&caller, Action::Read, Resource::None)?;

    let team = find_team(&state.db, id).await?;
    let members = membership::members_of(&state.db, id).await?;
    let visits = visit::Entity::find()
        .filter(visit::Column::TeamId.eq(id))
        .order_by_asc(visit::Column::Date)
        .all(&state.db)
        .await?;

    Ok(Json(TeamDetail {
        team: Team::from_model(&team, &members),
        visits: visits.iter().map(VisitSummary::from).collect(),
    }))
}

/// Create a team, optionally moving identities into it
#[utoipa::path(
    post,
    path = "/api/teams",
    request_body = CreateTeamRequest,
    responses(
        (status = 201, description = "Team created", body = Team),
        (status = 403, description = "Administrators only", body = ErrorResponse),
        (status = 404, description = "Member not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "teams"
)]
pub async fn create_team(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(req): ApiJson<CreateTeamRequest>,
) -> ApiResult<(StatusCode, Json<Team>)> {
    let caller = caller(&state, &auth).await?;
    authorize(&caller, Action::CreateTeam, Resource::None)?;

    let name = required("Name", &req.name)?;
    let member_ids = req.member_ids.unwrap_or_default();
    ensure_users_exist(&state.db, &member_ids).await?;

    let now = Utc::now();
    let created = team::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    membership::add_members(&state.db, created.id, &member_ids).await?;
    let members = membership::members_of(&state.db, created.id).await?;

    info!(team_id = %created.id, members = members.len(), "Team created");

    Ok((StatusCode::CREATED, Json(Team::from_model(&created, &members))))
}

/// Rename a team or replace its member set
#[utoipa::path(
    put,
    path = "/api/teams/{id}",
    params(("id" = Uuid, Path, description = "Team ID")),
    request_body = UpdateTeamRequest,
    responses(
        (status = 200, description = "Team updated", body = Team),
        (status = 403, description = "Administrators only", body = ErrorResponse),
        (status = 404, description = "Team or member not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "teams"
)]
pub async fn update_team(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateTeamRequest>,
) -> ApiResult<Json<Team>> {
    let caller = caller(&state, &auth).await?;
    authorize(&caller, Action::UpdateTeam, Resource::None)?;

    let existing = find_team(&state.db, id).await?;
    if let Some(member_ids) = &req.member_ids {
        ensure_users_exist(&state.db, member_ids).await?;
    }

    let mut active: team::ActiveModel = existing.into();
    if let Some(name) = &req.name {
        active.name = Set(required("Name", name)?);
    }
    active.updated_at = Set(Utc::now());
    let updated = active.update(&state.db).await?;

    if let Some(member_ids) = &req.member_ids {
        membership::replace_members(&state.db, id, member_ids).await?;
    }
    let members = membership::members_of(&state.db, id).await?;

    info!(team_id = %id, "Team updated");

    Ok(Json(Team::from_model(&updated, &members)))
}

/// Delete a team; its members are left without a team
#[utoipa::path(
    delete,
    path = "/api/teams/{id}",
    params(("id" = Uuid, Path, description = "Team ID")),
    responses(
        (status = 200, description = "Team deleted", body = MessageResponse),
        (status = 403, description = "Administrators only", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 409, description = "Team still owns visits", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "teams"
)]
pub async fn delete_team(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let caller = caller(&state, &auth).await?;
    authorize(&caller, Action::DeleteTeam, Resource::None)?;

    find_team(&state.db, id).await?;

    let owned_visits = visit::Entity::find()
        .filter(visit::Column::TeamId.eq(id))
        .count(&state.db)
        .await?;
    if owned_visits > 0 {
        return Err(ApiError::Conflict(format!(
            "Team owns {} visit(s) and cannot be deleted",
            owned_visits
        )));
    }

    let detached = membership::detach_all(&state.db, id).await?;
    team::Entity::delete_by_id(id).exec(&state.db).await?;

    info!(team_id = %id, detached, "Team deleted");

    Ok(Json(MessageResponse::new("Team deleted successfully")))
}
