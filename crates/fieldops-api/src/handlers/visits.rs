//! Visit scheduling and lifecycle
//!
//! Handlers load records and hand the decisions to `fieldops_core`:
//! `plan_creation`, `plan_update`, `plan_completion` and `plan_cancellation`
//! authorize the caller and validate the status change before anything is
//! written.

use axum::{body::Bytes, extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use fieldops_core::calendar::{day_bounds, parse_day, parse_instant};
use fieldops_core::{
    authorize, plan_cancellation, plan_completion, plan_creation, plan_update, visit_scope,
    Action, Resource, VisitPatch, VisitScope, VisitSnapshot,
};
use fieldops_db::entities::{client, service, team, user, visit, visit_service};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, LoaderTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{caller, required};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::AuthUser;
use crate::models::*;
use crate::AppState;

/// Attach client, team, creator and services to each visit, preserving order
pub(crate) async fn expand_visits<C>(db: &C, visits: Vec<visit::Model>) -> Result<Vec<Visit>, DbErr>
where
    C: ConnectionTrait,
{
    if visits.is_empty() {
        return Ok(Vec::new());
    }

    let clients = visits.load_one(client::Entity, db).await?;
    let teams = visits.load_one(team::Entity, db).await?;
    let creators = visits.load_one(user::Entity, db).await?;
    let services = visits
        .load_many_to_many(service::Entity, visit_service::Entity, db)
        .await?;

    Ok(visits
        .iter()
        .zip(clients)
        .zip(teams)
        .zip(creators)
        .zip(services)
        .map(|((((visit, client), team), creator), services)| Visit {
            visit: VisitSummary::from(visit),
            client: client.map(Client::from),
            team: team.as_ref().map(TeamRef::from),
            created_by: creator.as_ref().map(UserSummary::from),
            services: services.into_iter().map(Service::from).collect(),
        })
        .collect())
}

async fn expand_visit(db: &DatabaseConnection, visit: visit::Model) -> ApiResult<Visit> {
    expand_visits(db, vec![visit])
        .await?
        .pop()
        .ok_or_else(|| ApiError::Internal("Visit vanished while loading relations".to_string()))
}

async fn find_visit(db: &DatabaseConnection, id: Uuid) -> ApiResult<visit::Model> {
    visit::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Visit"))
}

fn snapshot(model: &visit::Model) -> VisitSnapshot {
    VisitSnapshot {
        status: model.lifecycle_status(),
        team_id: model.team_id,
        notes: model.notes.clone(),
        image_url: model.image_url.clone(),
    }
}

async fn ensure_client(db: &DatabaseConnection, id: Uuid) -> ApiResult<()> {
    client::Entity::find_by_id(id)
        .one(db)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::not_found("Client"))
}

async fn ensure_team(db: &DatabaseConnection, id: Uuid) -> ApiResult<()> {
    team::Entity::find_by_id(id)
        .one(db)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::not_found("Team"))
}

/// Deduplicate service ids and check each one resolves
async fn ensure_services(db: &DatabaseConnection, ids: &[Uuid]) -> ApiResult<Vec<Uuid>> {
    let mut unique: Vec<Uuid> = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(id) {
            unique.push(*id);
        }
    }
    if unique.is_empty() {
        return Ok(unique);
    }

    let found: Vec<Uuid> = service::Entity::find()
        .filter(service::Column::Id.is_in(unique.clone()))
        .all(db)
        .await?
        .into_iter()
        .map(|s| s.id)
        .collect();

    match unique.iter().find(|id| !found.contains(id)) {
        Some(missing) => Err(ApiError::NotFound(format!("Service {} not found", missing))),
        None => Ok(unique),
    }
}

/// Make `service_ids` the exact service set of the visit
async fn replace_services(
    db: &DatabaseConnection,
    visit_id: Uuid,
    service_ids: &[Uuid],
) -> Result<(), DbErr> {
    visit_service::Entity::delete_many()
        .filter(visit_service::Column::VisitId.eq(visit_id))
        .exec(db)
        .await?;

    if service_ids.is_empty() {
        return Ok(());
    }

    let links = service_ids.iter().map(|service_id| visit_service::ActiveModel {
        visit_id: Set(visit_id),
        service_id: Set(*service_id),
    });
    visit_service::Entity::insert_many(links)
        .exec_without_returning(db)
        .await?;

    Ok(())
}

fn parse_optional(value: Option<&str>) -> ApiResult<Option<DateTime<Utc>>> {
    value.map(parse_instant).transpose().map_err(ApiError::from)
}

/// List visits
///
/// Field team callers only ever see their own team's visits; a `teamId`
/// filter they send is replaced.
#[utoipa::path(
    get,
    path = "/api/visits",
    params(VisitListQuery),
    responses(
        (status = 200, description = "Visits ordered by date", body = Vec<Visit>),
        (status = 400, description = "Invalid filter", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "visits"
)]
pub async fn list_visits(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<VisitListQuery>,
) -> ApiResult<Json<Vec<Visit>>> {
    let caller = caller(&state, &auth).await?;
    authorize(&caller, Action::Read, Resource::None)?;

    let mut condition = Condition::all();

    match visit_scope(&caller, query.team_id) {
        VisitScope::Empty => {
            debug!(user_id = %caller.id, "Field team caller without a team; no visits");
            return Ok(Json(Vec::new()));
        }
        VisitScope::Team(team_id) => {
            condition = condition.add(visit::Column::TeamId.eq(team_id));
        }
        VisitScope::Unrestricted => {}
    }

    if let Some(date) = &query.date {
        let (start, end) = day_bounds(parse_day(date)?);
        condition = condition.add(visit::Column::Date.between(start, end));
    }
    if let Some(status) = query.status {
        condition = condition.add(visit::Column::Status.eq(visit::VisitState::from(status)));
    }
    if let Some(client_id) = query.client_id {
        condition = condition.add(visit::Column::ClientId.eq(client_id));
    }

    debug!("Listing visits with filters: {:?}", query);

    let visits = visit::Entity::find()
        .filter(condition)
        .order_by_asc(visit::Column::Date)
        .order_by_asc(visit::Column::StartTime)
        .all(&state.db)
        .await?;

    Ok(Json(expand_visits(&state.db, visits).await?))
}

/// Get one visit
#[utoipa::path(
    get,
    path = "/api/visits/{id}",
    params(("id" = Uuid, Path, description = "Visit ID")),
    responses(
        (status = 200, description = "Visit", body = Visit),
        (status = 403, description = "Visit belongs to another team", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "visits"
)]
pub async fn get_visit(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Visit>> {
    let caller = caller(&state, &auth).await?;
    let visit = find_visit(&state.db, id).await?;

    authorize(&caller, Action::ReadVisit, Resource::TeamVisit(visit.team_id))?;

    Ok(Json(expand_visit(&state.db, visit).await?))
}

/// Schedule a visit
///
/// The visit starts as `SCHEDULED` and records the caller as its creator.
#[utoipa::path(
    post,
    path = "/api/visits",
    request_body = CreateVisitRequest,
    responses(
        (status = 201, description = "Visit scheduled", body = Visit),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Administrators and sellers only", body = ErrorResponse),
        (status = 404, description = "Client, team or service not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "visits"
)]
pub async fn create_visit(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(req): ApiJson<CreateVisitRequest>,
) -> ApiResult<(StatusCode, Json<Visit>)> {
    let caller = caller(&state, &auth).await?;
    let status = plan_creation(&caller)?;

    let title = required("Title", &req.title)?;
    let date = parse_instant(&req.date)?;
    let start_time = parse_instant(&req.start_time)?;
    let end_time = parse_optional(req.end_time.as_deref())?;

    ensure_client(&state.db, req.client_id).await?;
    ensure_team(&state.db, req.team_id).await?;
    let service_ids = ensure_services(&state.db, &req.service_ids).await?;

    let now = Utc::now();
    let created = visit::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(title),
        description: Set(req.description),
        date: Set(date),
        start_time: Set(start_time),
        end_time: Set(end_time),
        status: Set(status.into()),
        location: Set(req.location),
        notes: Set(req.notes),
        image_url: Set(None),
        client_id: Set(req.client_id),
        team_id: Set(req.team_id),
        created_by_id: Set(caller.id),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    replace_services(&state.db, created.id, &service_ids).await?;

    info!(
        visit_id = %created.id,
        team_id = %created.team_id,
        created_by = %caller.id,
        "Visit scheduled"
    );

    Ok((StatusCode::CREATED, Json(expand_visit(&state.db, created).await?)))
}

/// Partially update a visit
#[utoipa::path(
    put,
    path = "/api/visits/{id}",
    params(("id" = Uuid, Path, description = "Visit ID")),
    request_body = UpdateVisitRequest,
    responses(
        (status = 200, description = "Visit updated", body = Visit),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Not a member of the owning team", body = ErrorResponse),
        (status = 404, description = "Visit or referenced record not found", body = ErrorResponse),
        (status = 409, description = "Status change not allowed", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "visits"
)]
pub async fn update_visit(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateVisitRequest>,
) -> ApiResult<Json<Visit>> {
    let caller = caller(&state, &auth).await?;
    let existing = find_visit(&state.db, id).await?;
    authorize(&caller, Action::UpdateVisit, Resource::TeamVisit(existing.team_id))?;

    let patch = VisitPatch {
        title: req.title.as_deref().map(|t| required("Title", t)).transpose()?,
        description: req.description,
        date: parse_optional(req.date.as_deref())?,
        start_time: parse_optional(req.start_time.as_deref())?,
        end_time: parse_optional(req.end_time.as_deref())?,
        status: req.status,
        location: req.location,
        notes: req.notes,
        image_url: req.image_url,
        client_id: req.client_id,
        team_id: req.team_id,
        service_ids: req.service_ids,
    };
    let patch = plan_update(&caller, &snapshot(&existing), patch)?;

    if let Some(client_id) = patch.client_id {
        ensure_client(&state.db, client_id).await?;
    }
    if let Some(team_id) = patch.team_id {
        ensure_team(&state.db, team_id).await?;
    }
    let service_ids = match &patch.service_ids {
        Some(ids) => Some(ensure_services(&state.db, ids).await?),
        None => None,
    };

    let mut active: visit::ActiveModel = existing.into();
    if let Some(title) = patch.title {
        active.title = Set(title);
    }
    if let Some(description) = patch.description {
        active.description = Set(description);
    }
    if let Some(date) = patch.date {
        active.date = Set(date);
    }
    if let Some(start_time) = patch.start_time {
        active.start_time = Set(start_time);
    }
    if let Some(end_time) = patch.end_time {
        active.end_time = Set(Some(end_time));
    }
    if let Some(status) = patch.status {
        active.status = Set(status.into());
    }
    if let Some(location) = patch.location {
        active.location = Set(location);
    }
    if let Some(notes) = patch.notes {
        active.notes = Set(notes);
    }
    if let Some(image_url) = patch.image_url {
        active.image_url = Set(image_url);
    }
    if let Some(client_id) = patch.client_id {
        active.client_id = Set(client_id);
    }
    if let Some(team_id) = patch.team_id {
        active.team_id = Set(team_id);
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(&state.db).await?;

    if let Some(service_ids) = service_ids {
        replace_services(&state.db, id, &service_ids).await?;
    }

    info!(visit_id = %id, user_id = %caller.id, "Visit updated");

    Ok(Json(expand_visit(&state.db, updated).await?))
}

/// Mark a visit completed
///
/// Sets the end time to now. Notes and image are only replaced by non-empty
/// values. The body may be empty.
#[utoipa::path(
    put,
    path = "/api/visits/{id}/complete",
    params(("id" = Uuid, Path, description = "Visit ID")),
    request_body(content = CompleteVisitRequest, description = "Optional notes and image"),
    responses(
        (status = 200, description = "Visit completed", body = Visit),
        (status = 403, description = "Not a member of the owning team", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 409, description = "Visit already completed or cancelled", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "visits"
)]
pub async fn complete_visit(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    body: Bytes,
) -> ApiResult<Json<Visit>> {
    let caller = caller(&state, &auth).await?;
    let existing = find_visit(&state.db, id).await?;
    authorize(&caller, Action::CompleteVisit, Resource::TeamVisit(existing.team_id))?;

    let req: CompleteVisitRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CompleteVisitRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::Validation(format!("Invalid request body: {}", e)))?
    };

    let completion = plan_completion(
        &caller,
        &snapshot(&existing),
        req.notes,
        req.image_url,
        Utc::now(),
    )?;

    let mut active: visit::ActiveModel = existing.into();
    active.status = Set(completion.status.into());
    active.end_time = Set(Some(completion.end_time));
    active.notes = Set(completion.notes);
    active.image_url = Set(completion.image_url);
    active.updated_at = Set(Utc::now());

    let updated = active.update(&state.db).await?;
    info!(visit_id = %id, user_id = %caller.id, "Visit completed");

    Ok(Json(expand_visit(&state.db, updated).await?))
}

/// Cancel a visit
///
/// The record is kept with status `CANCELLED`.
#[utoipa::path(
    delete,
    path = "/api/visits/{id}",
    params(("id" = Uuid, Path, description = "Visit ID")),
    responses(
        (status = 200, description = "Visit cancelled", body = CancelVisitResponse),
        (status = 403, description = "Administrators and sellers only", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 409, description = "Visit already completed or cancelled", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "visits"
)]
pub async fn cancel_visit(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<CancelVisitResponse>> {
    let caller = caller(&state, &auth).await?;
    let existing = find_visit(&state.db, id).await?;

    let status = plan_cancellation(&caller, &snapshot(&existing))?;

    let mut active: visit::ActiveModel = existing.into();
    active.status = Set(status.into());
    active.updated_at = Set(Utc::now());

    let updated = active.update(&state.db).await?;
    info!(visit_id = %id, user_id = %caller.id, "Visit cancelled");

    Ok(Json(CancelVisitResponse {
        message: "Visit cancelled successfully".to_string(),
        visit: expand_visit(&state.db, updated).await?,
    }))
}
