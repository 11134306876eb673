//! Service catalog

use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use fieldops_core::{authorize, Action, Resource};
use fieldops_db::entities::{service, visit, visit_service};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
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

fn validate_duration(duration: i32) -> ApiResult<i32> {
    if duration <= 0 {
        return Err(ApiError::Validation(
            "Duration must be a positive number of minutes".to_string(),
        ));
    }
    Ok(duration)
}

/// List services
#[utoipa::path(
    get,
    path = "/api/services",
    responses(
        (status = 200, description = "All services", body = Vec<Service>)
    ),
    security(("bearer_auth" = [])),
    tag = "services"
)]
pub async fn list_services(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<Vec<Service>>> {
    let caller = caller(&state, &auth).await?;
    authorize(&caller, Action::Read, Resource::None)?;

    let services = service::Entity::find()
        .order_by_asc(service::Column::Name)
        .all(&state.db)
        .await?;

    Ok(Json(services.into_iter().map(Service::from).collect()))
}

/// Get a service with the visits that include it
#[utoipa::path(
    get,
    path = "/api/services/{id}",
    params(("id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Service", body = ServiceDetail),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "services"
)]
pub async fn get_service(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ServiceDetail>> {
    let caller = caller(&state, &auth).await?;
    authorize(&caller, Action::Read, Resource::None)?;

    let service = service::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Service"))?;
    let visits = service
        .find_related(visit::Entity)
        .order_by_asc(visit::Column::Date)
        .all(&state.db)
        .await?;

    Ok(Json(ServiceDetail {
        service: service.into(),
        visits: visits.iter().map(VisitSummary::from).collect(),
    }))
}

/// Add a service to the catalog
#[utoipa::path(
    post,
    path = "/api/services",
    request_body = CreateServiceRequest,
    responses(
        (status = 201, description = "Service created", body = Service),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Administrators only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "services"
)]
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(req): ApiJson<CreateServiceRequest>,
) -> ApiResult<(StatusCode, Json<Service>)> {
    let caller = caller(&state, &auth).await?;
    authorize(&caller, Action::CreateService, Resource::None)?;

    let now = Utc::now();
    let created = service::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(required("Name", &req.name)?),
        description: Set(req.description),
        duration: Set(validate_duration(req.duration)?),
        price: Set(req.price),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    info!(service_id = %created.id, "Service created");

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Update a service
#[utoipa::path(
    put,
    path = "/api/services/{id}",
    params(("id" = Uuid, Path, description = "Service ID")),
    request_body = UpdateServiceRequest,
    responses(
        (status = 200, description = "Service updated", body = Service),
        (status = 403, description = "Administrators only", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "services"
)]
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateServiceRequest>,
) -> ApiResult<Json<Service>> {
    let caller = caller(&state, &auth).await?;
    authorize(&caller, Action::UpdateService, Resource::None)?;

    let existing = service::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Service"))?;

    let mut active: service::ActiveModel = existing.into();
    if let Some(name) = &req.name {
        active.name = Set(required("Name", name)?);
    }
    if let Some(description) = req.description {
        active.description = Set(description);
    }
    if let Some(duration) = req.duration {
        active.duration = Set(validate_duration(duration)?);
    }
    if let Some(price) = req.price {
        active.price = Set(price);
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(&state.db).await?;
    info!(service_id = %id, "Service updated");

    Ok(Json(updated.into()))
}

/// Remove a service from the catalog and from every visit listing it
#[utoipa::path(
    delete,
    path = "/api/services/{id}",
    params(("id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Service deleted", body = MessageResponse),
        (status = 403, description = "Administrators only", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "services"
)]
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let caller = caller(&state, &auth).await?;
    authorize(&caller, Action::DeleteService, Resource::None)?;

    let existing = service::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Service"))?;

    let detached = visit_service::Entity::delete_many()
        .filter(visit_service::Column::ServiceId.eq(id))
        .exec(&state.db)
        .await?;
    existing.delete(&state.db).await?;

    info!(service_id = %id, visits = detached.rows_affected, "Service deleted");

    Ok(Json(MessageResponse::new("Service deleted successfully")))
}
