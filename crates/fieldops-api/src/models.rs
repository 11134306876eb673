//! Request and response bodies
//!
//! All fields are camelCase on the wire. Timestamps are RFC 3339 UTC.

use chrono::{DateTime, Utc};
use fieldops_core::{Role, StatusCounts, TeamHours, VisitStatus};
use fieldops_db::entities::{client, service, team, user, visit};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable message
    pub message: String,
    /// Underlying failure, only for internal errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// ============================================================
// Auth
// ============================================================

/// Login request
///
/// Both fields are optional in the schema so a missing one yields a 400 with
/// a JSON message rather than a deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Identity as returned to its owner after login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub team_id: Option<Uuid>,
}

impl From<&user::Model> for SessionUser {
    fn from(model: &user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            email: model.email.clone(),
            role: model.role.into(),
            team_id: model.team_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: SessionUser,
    /// Bearer token for the `Authorization` header
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

// ============================================================
// Users
// ============================================================

/// Short identity view embedded in teams and visits
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&user::Model> for UserSummary {
    fn from(model: &user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            email: model.email.clone(),
            role: model.role.into(),
        }
    }
}

/// Short team view embedded in identities and visits
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeamRef {
    pub id: Uuid,
    pub name: String,
}

impl From<&team::Model> for TeamRef {
    fn from(model: &team::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
        }
    }
}

/// Identity; the password hash is never serialized
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub team_id: Option<Uuid>,
    pub team: Option<TeamRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn from_model(model: &user::Model, team: Option<&team::Model>) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            email: model.email.clone(),
            role: model.role.into(),
            team_id: model.team_id,
            team: team.map(TeamRef::from),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Defaults to `FIELD_TEAM`
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub team_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Administrators only
    #[serde(default)]
    pub role: Option<Role>,
    /// Administrators only; `null` removes the identity from its team
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<Uuid>)]
    pub team_id: Option<Option<Uuid>>,
}

// ============================================================
// Teams
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub members: Vec<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Team {
    pub fn from_model(model: &team::Model, members: &[user::Model]) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            members: members.iter().map(UserSummary::from).collect(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Team with its visits
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamDetail {
    #[serde(flatten)]
    pub team: Team,
    pub visits: Vec<VisitSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    pub name: String,
    /// Identities to move into the new team
    #[serde(default)]
    pub member_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeamRequest {
    #[serde(default)]
    pub name: Option<String>,
    /// Replaces the full member set when present
    #[serde(default)]
    pub member_ids: Option<Vec<Uuid>>,
}

// ============================================================
// Clients
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<client::Model> for Client {
    fn from(model: client::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            address: model.address,
            city: model.city,
            state: model.state,
            zip_code: model.zip_code,
            phone: model.phone,
            email: model.email,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Client with its visits
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientDetail {
    #[serde(flatten)]
    pub client: Client,
    pub visits: Vec<VisitSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientRequest {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Partial client update; `null` clears an optional field
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClientRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub state: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub zip_code: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub email: Option<Option<String>>,
}

// ============================================================
// Services
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Minutes
    pub duration: i32,
    pub price: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<service::Model> for Service {
    fn from(model: service::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            duration: model.duration,
            price: model.price,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Service with the visits that include it
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDetail {
    #[serde(flatten)]
    pub service: Service,
    pub visits: Vec<VisitSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub duration: i32,
    #[serde(default)]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub duration: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<f64>)]
    pub price: Option<Option<f64>>,
}

// ============================================================
// Visits
// ============================================================

/// Visit fields without related records
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisitSummary {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: VisitStatus,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    pub client_id: Uuid,
    pub team_id: Uuid,
    pub created_by_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&visit::Model> for VisitSummary {
    fn from(model: &visit::Model) -> Self {
        Self {
            id: model.id,
            title: model.title.clone(),
            description: model.description.clone(),
            date: model.date,
            start_time: model.start_time,
            end_time: model.end_time,
            status: model.lifecycle_status(),
            location: model.location.clone(),
            notes: model.notes.clone(),
            image_url: model.image_url.clone(),
            client_id: model.client_id,
            team_id: model.team_id,
            created_by_id: model.created_by_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Visit with its client, team, creator and services
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    #[serde(flatten)]
    pub visit: VisitSummary,
    pub client: Option<Client>,
    pub team: Option<TeamRef>,
    pub created_by: Option<UserSummary>,
    pub services: Vec<Service>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVisitRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// `YYYY-MM-DD` or RFC 3339
    pub date: String,
    /// RFC 3339
    pub start_time: String,
    #[serde(default)]
    pub end_time: Option<String>,
    pub client_id: Uuid,
    pub team_id: Uuid,
    #[serde(default)]
    pub service_ids: Vec<Uuid>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial visit update
///
/// `teamId` is honoured for administrators and sellers only. `serviceIds`
/// replaces the whole service set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVisitRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub status: Option<VisitStatus>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub image_url: Option<Option<String>>,
    #[serde(default)]
    pub client_id: Option<Uuid>,
    #[serde(default)]
    pub team_id: Option<Uuid>,
    #[serde(default)]
    pub service_ids: Option<Vec<Uuid>>,
}

/// Body of the complete action; both fields keep their stored value when absent
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteVisitRequest {
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CancelVisitResponse {
    pub message: String,
    pub visit: Visit,
}

/// Visit list filters
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct VisitListQuery {
    /// Calendar day (`YYYY-MM-DD`); matches the whole day
    pub date: Option<String>,
    /// Ignored for field team callers, who only see their own team
    pub team_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub status: Option<VisitStatus>,
}

// ============================================================
// Reports
// ============================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// Inclusive lower bound on the visit date
    pub start_date: Option<String>,
    /// Inclusive upper bound; a bare date covers the whole day
    pub end_date: Option<String>,
    /// Hours report only
    pub team_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamReport {
    pub team_id: Uuid,
    pub stats: StatusCounts,
    pub visits: Vec<Visit>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientReport {
    pub client: Client,
    pub stats: StatusCounts,
    pub visits: Vec<Visit>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportPeriod {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HoursReport {
    pub period: ReportPeriod,
    pub teams: Vec<TeamHours>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nullable_distinguishes_absent_from_null() {
        let absent: UpdateClientRequest = serde_json::from_str(r#"{"name":"ACME"}"#).unwrap();
        assert_eq!(absent.phone, None);

        let cleared: UpdateClientRequest = serde_json::from_str(r#"{"phone":null}"#).unwrap();
        assert_eq!(cleared.phone, Some(None));

        let set: UpdateClientRequest = serde_json::from_str(r#"{"phone":"123"}"#).unwrap();
        assert_eq!(set.phone, Some(Some("123".to_string())));
    }

    #[test]
    fn test_update_visit_request_camel_case() {
        let body = r#"{"teamId":"7f3f1f2e-8c2a-4b8e-9d5e-1a2b3c4d5e6f","status":"IN_PROGRESS","imageUrl":null}"#;
        let req: UpdateVisitRequest = serde_json::from_str(body).unwrap();

        assert!(req.team_id.is_some());
        assert_eq!(req.status, Some(VisitStatus::InProgress));
        assert_eq!(req.image_url, Some(None));
        assert_eq!(req.service_ids, None);
    }

    #[test]
    fn test_error_response_omits_empty_error() {
        let json = serde_json::to_value(ErrorResponse {
            message: "Visit not found".to_string(),
            error: None,
        })
        .unwrap();

        assert_eq!(json, serde_json::json!({ "message": "Visit not found" }));
    }
}
