//! Read-only aggregates over visits

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use fieldops_core::calendar::{parse_instant, parse_range_end};
use fieldops_core::{
    authorize, hours_by_team, Action, CompletedVisit, Resource, StatusCounts, VisitStatus,
};
use fieldops_db::entities::{client, team, visit};
use sea_orm::{ColumnTrait, Condition, EntityTrait, LoaderTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::caller;
use super::visits::expand_visits;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiPath, ApiQuery};
use crate::middleware::AuthUser;
use crate::models::*;
use crate::AppState;

/// Inclusive date filter; each bound applies on its own when present
fn date_condition(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Condition {
    let mut condition = Condition::all();
    if let Some(start) = start {
        condition = condition.add(visit::Column::Date.gte(start));
    }
    if let Some(end) = end {
        condition = condition.add(visit::Column::Date.lte(end));
    }
    condition
}

type DateBounds = (Option<DateTime<Utc>>, Option<DateTime<Utc>>);

fn parse_bounds(query: &ReportQuery) -> ApiResult<DateBounds> {
    let start = query.start_date.as_deref().map(parse_instant).transpose()?;
    let end = query.end_date.as_deref().map(parse_range_end).transpose()?;
    Ok((start, end))
}

/// Visits of one team with per-status counts
#[utoipa::path(
    get,
    path = "/api/reports/team/{team_id}",
    params(
        ("team_id" = Uuid, Path, description = "Team ID"),
        ReportQuery
    ),
    responses(
        (status = 200, description = "Team report", body = TeamReport),
        (status = 403, description = "Administrators only", body = ErrorResponse),
        (status = 404, description = "Team not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn team_report(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(team_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<ReportQuery>,
) -> ApiResult<Json<TeamReport>> {
    let caller = caller(&state, &auth).await?;
    authorize(&caller, Action::ViewTeamReport, Resource::None)?;

    let (start, end) = parse_bounds(&query)?;
    team::Entity::find_by_id(team_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Team"))?;

    let visits = visit::Entity::find()
        .filter(visit::Column::TeamId.eq(team_id))
        .filter(date_condition(start, end))
        .order_by_asc(visit::Column::Date)
        .all(&state.db)
        .await?;

    let stats = StatusCounts::tally(visits.iter().map(|v| v.lifecycle_status()));
    debug!(%team_id, total = stats.total, "Team report");

    Ok(Json(TeamReport {
        team_id,
        stats,
        visits: expand_visits(&state.db, visits).await?,
    }))
}

/// Visits of one client with per-status counts
///
/// Open to every authenticated caller.
#[utoipa::path(
    get,
    path = "/api/reports/client/{client_id}",
    params(
        ("client_id" = Uuid, Path, description = "Client ID"),
        ReportQuery
    ),
    responses(
        (status = 200, description = "Client report", body = ClientReport),
        (status = 404, description = "Client not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn client_report(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(client_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<ReportQuery>,
) -> ApiResult<Json<ClientReport>> {
    let caller = caller(&state, &auth).await?;
    authorize(&caller, Action::ViewClientReport, Resource::None)?;

    let (start, end) = parse_bounds(&query)?;
    let client = client::Entity::find_by_id(client_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Client"))?;

    let visits = visit::Entity::find()
        .filter(visit::Column::ClientId.eq(client_id))
        .filter(date_condition(start, end))
        .order_by_asc(visit::Column::Date)
        .all(&state.db)
        .await?;

    let stats = StatusCounts::tally(visits.iter().map(|v| v.lifecycle_status()));
    debug!(%client_id, total = stats.total, "Client report");

    Ok(Json(ClientReport {
        client: client.into(),
        stats,
        visits: expand_visits(&state.db, visits).await?,
    }))
}

/// Hours worked per team over completed visits
#[utoipa::path(
    get,
    path = "/api/reports/hours",
    params(ReportQuery),
    responses(
        (status = 200, description = "Hours per team", body = HoursReport),
        (status = 400, description = "Start or end date missing", body = ErrorResponse),
        (status = 403, description = "Administrators only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn hours_report(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<ReportQuery>,
) -> ApiResult<Json<HoursReport>> {
    let caller = caller(&state, &auth).await?;
    authorize(&caller, Action::ViewHoursReport, Resource::None)?;

    let (start_date, end_date) = match (&query.start_date, &query.end_date) {
        (Some(start), Some(end)) if !start.trim().is_empty() && !end.trim().is_empty() => {
            (start.clone(), end.clone())
        }
        _ => {
            return Err(ApiError::Validation(
                "Start and end dates are required".to_string(),
            ))
        }
    };
    let start = parse_instant(&start_date)?;
    let end = parse_range_end(&end_date)?;

    let mut finder = visit::Entity::find()
        .filter(visit::Column::Status.eq(visit::VisitState::from(VisitStatus::Completed)))
        .filter(date_condition(Some(start), Some(end)));
    if let Some(team_id) = query.team_id {
        finder = finder.filter(visit::Column::TeamId.eq(team_id));
    }

    let visits = finder
        .order_by_asc(visit::Column::Date)
        .order_by_asc(visit::Column::StartTime)
        .all(&state.db)
        .await?;
    let teams = visits.load_one(team::Entity, &state.db).await?;
    let clients = visits.load_one(client::Entity, &state.db).await?;

    let completed = visits
        .into_iter()
        .zip(teams)
        .zip(clients)
        .map(|((visit, team), client)| CompletedVisit {
            id: visit.id,
            title: visit.title,
            date: visit.date,
            start_time: Some(visit.start_time),
            end_time: visit.end_time,
            team_id: visit.team_id,
            team_name: team.map(|t| t.name).unwrap_or_default(),
            client_name: client.map(|c| c.name).unwrap_or_default(),
        });

    let teams = hours_by_team(completed);
    debug!(teams = teams.len(), "Hours report");

    Ok(Json(HoursReport {
        period: ReportPeriod {
            start_date,
            end_date,
        },
        teams,
    }))
}
