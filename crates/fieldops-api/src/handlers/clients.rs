//! Client records

use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use fieldops_core::{authorize, Action, Resource};
use fieldops_db::entities::{client, visit};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
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

/// List clients
#[utoipa::path(
    get,
    path = "/api/clients",
    responses(
        (status = 200, description = "All clients", body = Vec<Client>)
    ),
    security(("bearer_auth" = [])),
    tag = "clients"
)]
pub async fn list_clients(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<Vec<Client>>> {
    let caller = caller(&state, &auth).await?;
    authorize(&caller, Action::Read, Resource::None)?;

    let clients = client::Entity::find()
        .order_by_asc(client::Column::Name)
        .all(&state.db)
        .await?;

    Ok(Json(clients.into_iter().map(Client::from).collect()))
}

/// Get a client with its visits
#[utoipa::path(
    get,
    path = "/api/clients/{id}",
    params(("id" = Uuid, Path, description = "Client ID")),
    responses(
        (status = 200, description = "Client", body = ClientDetail),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "clients"
)]
pub async fn get_client(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ClientDetail>> {
    let caller = caller(&state, &auth).await?;
    authorize(&caller, Action::Read, Resource::None)?;

    let client = client::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Client"))?;
    let visits = client
        .find_related(visit::Entity)
        .order_by_asc(visit::Column::Date)
        .all(&state.db)
        .await?;

    Ok(Json(ClientDetail {
        client: client.into(),
        visits: visits.iter().map(VisitSummary::from).collect(),
    }))
}

/// Register a client
#[utoipa::path(
    post,
    path = "/api/clients",
    request_body = CreateClientRequest,
    responses(
        (status = 201, description = "Client created", body = Client),
        (status = 400, description = "Name missing", body = ErrorResponse),
        (status = 403, description = "Administrators and sellers only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "clients"
)]
pub async fn create_client(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(req): ApiJson<CreateClientRequest>,
) -> ApiResult<(StatusCode, Json<Client>)> {
    let caller = caller(&state, &auth).await?;
    authorize(&caller, Action::CreateClient, Resource::None)?;

    let now = Utc::now();
    let created = client::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(required("Name", &req.name)?),
        address: Set(req.address),
        city: Set(req.city),
        state: Set(req.state),
        zip_code: Set(req.zip_code),
        phone: Set(req.phone),
        email: Set(req.email),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    info!(client_id = %created.id, "Client created");

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Update a client
#[utoipa::path(
    put,
    path = "/api/clients/{id}",
    params(("id" = Uuid, Path, description = "Client ID")),
    request_body = UpdateClientRequest,
    responses(
        (status = 200, description = "Client updated", body = Client),
        (status = 403, description = "Administrators and sellers only", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "clients"
)]
pub async fn update_client(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateClientRequest>,
) -> ApiResult<Json<Client>> {
    let caller = caller(&state, &auth).await?;
    authorize(&caller, Action::UpdateClient, Resource::None)?;

    let existing = client::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Client"))?;

    let mut active: client::ActiveModel = existing.into();
    if let Some(name) = &req.name {
        active.name = Set(required("Name", name)?);
    }
    if let Some(address) = req.address {
        active.address = Set(address);
    }
    if let Some(city) = req.city {
        active.city = Set(city);
    }
    if let Some(state_code) = req.state {
        active.state = Set(state_code);
    }
    if let Some(zip_code) = req.zip_code {
        active.zip_code = Set(zip_code);
    }
    if let Some(phone) = req.phone {
        active.phone = Set(phone);
    }
    if let Some(email) = req.email {
        active.email = Set(email);
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(&state.db).await?;
    info!(client_id = %id, "Client updated");

    Ok(Json(updated.into()))
}

/// Delete a client
#[utoipa::path(
    delete,
    path = "/api/clients/{id}",
    params(("id" = Uuid, Path, description = "Client ID")),
    responses(
        (status = 200, description = "Client deleted", body = MessageResponse),
        (status = 403, description = "Administrators only", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 409, description = "Client still has visits", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "clients"
)]
pub async fn delete_client(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let caller = caller(&state, &auth).await?;
    authorize(&caller, Action::DeleteClient, Resource::None)?;

    let existing = client::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Client"))?;

    let visits = visit::Entity::find()
        .filter(visit::Column::ClientId.eq(id))
        .count(&state.db)
        .await?;
    if visits > 0 {
        return Err(ApiError::Conflict(format!(
            "Client has {} visit(s) and cannot be deleted",
            visits
        )));
    }

    existing.delete(&state.db).await?;
    info!(client_id = %id, "Client deleted");

    Ok(Json(MessageResponse::new("Client deleted successfully")))
}
