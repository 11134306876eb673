//! Integration tests for visit scheduling and lifecycle

mod common;

use axum::http::{Method, StatusCode};
use chrono::{TimeZone, Utc};
use common::Fixture;
use fieldops_core::VisitStatus;
use serde_json::{json, Value};

async fn schedule(fx: &Fixture, team_id: uuid::Uuid) -> Value {
    let (status, body) = fx
        .as_user(
            &fx.seller,
            Method::POST,
            "/api/visits",
            Some(json!({
                "title": "Instalação de equipamento",
                "date": "2025-03-10",
                "startTime": "2025-03-10T09:00:00Z",
                "clientId": fx.client.id,
                "teamId": team_id,
                "serviceIds": [fx.service.id],
                "location": "Loja 2"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "unexpected body: {}", body);
    body
}

#[tokio::test]
async fn test_create_visit_starts_scheduled() {
    let fx = Fixture::new().await;

    let visit = schedule(&fx, fx.team.id).await;

    assert_eq!(visit["status"], "SCHEDULED");
    assert_eq!(visit["createdById"], fx.seller.id.to_string());
    assert_eq!(visit["createdBy"]["email"], "seller@example.com");
    assert_eq!(visit["client"]["name"], "Padaria Central");
    assert_eq!(visit["team"]["id"], fx.team.id.to_string());
    assert_eq!(visit["services"].as_array().unwrap().len(), 1);
    assert!(visit["endTime"].is_null());
}

#[tokio::test]
async fn test_field_team_cannot_create_visit() {
    let fx = Fixture::new().await;

    let (status, _) = fx
        .as_user(
            &fx.field,
            Method::POST,
            "/api/visits",
            Some(json!({
                "title": "Visita",
                "date": "2025-03-10",
                "startTime": "2025-03-10T09:00:00Z",
                "clientId": fx.client.id,
                "teamId": fx.team.id
            })),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_visit_unknown_client() {
    let fx = Fixture::new().await;

    let (status, _) = fx
        .as_user(
            &fx.admin,
            Method::POST,
            "/api/visits",
            Some(json!({
                "title": "Visita",
                "date": "2025-03-10",
                "startTime": "2025-03-10T09:00:00Z",
                "clientId": uuid::Uuid::new_v4(),
                "teamId": fx.team.id
            })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_field_team_list_is_pinned_to_own_team() {
    let fx = Fixture::new().await;
    let own = schedule(&fx, fx.team.id).await;
    schedule(&fx, fx.other_team.id).await;

    let uri = format!("/api/visits?teamId={}", fx.other_team.id);
    let (status, body) = fx.as_user(&fx.field, Method::GET, &uri, None).await;

    assert_eq!(status, StatusCode::OK);
    let visits = body.as_array().unwrap();
    assert_eq!(visits.len(), 1);
    assert_eq!(visits[0]["id"], own["id"]);

    // Admins see everything
    let (_, body) = fx.as_user(&fx.admin, Method::GET, "/api/visits", None).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_list_filters_by_day() {
    let fx = Fixture::new().await;
    let monday = Utc.with_ymd_and_hms(2025, 3, 10, 14, 0, 0).unwrap();
    let tuesday = Utc.with_ymd_and_hms(2025, 3, 11, 8, 0, 0).unwrap();
    fx.insert_visit("Segunda", fx.team.id, VisitStatus::Scheduled, monday, None)
        .await;
    fx.insert_visit("Terça", fx.team.id, VisitStatus::Scheduled, tuesday, None)
        .await;

    let (status, body) = fx
        .as_user(&fx.admin, Method::GET, "/api/visits?date=2025-03-10", None)
        .await;

    assert_eq!(status, StatusCode::OK);
    let visits = body.as_array().unwrap();
    assert_eq!(visits.len(), 1);
    assert_eq!(visits[0]["title"], "Segunda");
}

#[tokio::test]
async fn test_field_team_cannot_touch_other_team_visit() {
    let fx = Fixture::new().await;
    let visit = schedule(&fx, fx.team.id).await;
    let id = visit["id"].as_str().unwrap();

    let (status, _) = fx
        .as_user(&fx.outsider, Method::GET, &format!("/api/visits/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = fx
        .as_user(
            &fx.outsider,
            Method::PUT,
            &format!("/api/visits/{}", id),
            Some(json!({ "notes": "not mine" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = fx
        .as_user(
            &fx.outsider,
            Method::PUT,
            &format!("/api/visits/{}/complete", id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_field_team_update_ignores_team_reassignment() {
    let fx = Fixture::new().await;
    let visit = schedule(&fx, fx.team.id).await;
    let id = visit["id"].as_str().unwrap();

    let (status, body) = fx
        .as_user(
            &fx.field,
            Method::PUT,
            &format!("/api/visits/{}", id),
            Some(json!({
                "teamId": fx.other_team.id,
                "status": "IN_PROGRESS",
                "notes": "Cliente ausente, aguardando"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "unexpected body: {}", body);
    assert_eq!(body["teamId"], fx.team.id.to_string());
    assert_eq!(body["status"], "IN_PROGRESS");
    assert_eq!(body["notes"], "Cliente ausente, aguardando");
}

#[tokio::test]
async fn test_complete_then_reopen_is_rejected() {
    let fx = Fixture::new().await;
    let visit = schedule(&fx, fx.team.id).await;
    let id = visit["id"].as_str().unwrap();

    let (status, completed) = fx
        .as_user(
            &fx.field,
            Method::PUT,
            &format!("/api/visits/{}/complete", id),
            Some(json!({ "notes": "Concluído", "imageUrl": "https://img.example.com/1.jpg" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["status"], "COMPLETED");
    assert_eq!(completed["notes"], "Concluído");
    assert!(!completed["endTime"].is_null());

    let (status, _) = fx
        .as_user(
            &fx.admin,
            Method::PUT,
            &format!("/api/visits/{}", id),
            Some(json!({ "status": "SCHEDULED" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = fx
        .as_user(
            &fx.field,
            Method::PUT,
            &format!("/api/visits/{}/complete", id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_complete_with_empty_body_keeps_notes() {
    let fx = Fixture::new().await;
    let visit = schedule(&fx, fx.team.id).await;
    let id = visit["id"].as_str().unwrap();

    fx.as_user(
        &fx.field,
        Method::PUT,
        &format!("/api/visits/{}", id),
        Some(json!({ "notes": "Portão lateral" })),
    )
    .await;

    let (status, body) = fx
        .as_user(
            &fx.field,
            Method::PUT,
            &format!("/api/visits/{}/complete", id),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notes"], "Portão lateral");
}

#[tokio::test]
async fn test_seller_cannot_complete() {
    let fx = Fixture::new().await;
    let visit = schedule(&fx, fx.team.id).await;
    let id = visit["id"].as_str().unwrap();

    let (status, _) = fx
        .as_user(
            &fx.seller,
            Method::PUT,
            &format!("/api/visits/{}/complete", id),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_cancel_keeps_record() {
    let fx = Fixture::new().await;
    let visit = schedule(&fx, fx.team.id).await;
    let id = visit["id"].as_str().unwrap();

    let (status, body) = fx
        .as_user(&fx.seller, Method::DELETE, &format!("/api/visits/{}", id), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Visit cancelled successfully");
    assert_eq!(body["visit"]["status"], "CANCELLED");

    let (status, body) = fx
        .as_user(&fx.admin, Method::GET, &format!("/api/visits/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "CANCELLED");

    let (status, _) = fx
        .as_user(&fx.field, Method::DELETE, &format!("/api/visits/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_outsider_with_invalid_input_is_forbidden() {
    let fx = Fixture::new().await;
    let visit = schedule(&fx, fx.team.id).await;
    let id = visit["id"].as_str().unwrap();

    let (status, _) = fx
        .as_user(
            &fx.outsider,
            Method::PUT,
            &format!("/api/visits/{}", id),
            Some(json!({ "date": "not-a-date", "title": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = fx
        .send(
            Method::PUT,
            &format!("/api/visits/{}/complete", id),
            Some(&fx.token_for(&fx.outsider)),
            Some(json!(["not", "an", "object"])),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Members still get the validation error
    let (status, _) = fx
        .as_user(
            &fx.field,
            Method::PUT,
            &format!("/api/visits/{}", id),
            Some(json!({ "date": "not-a-date" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_replaces_service_set() {
    let fx = Fixture::new().await;
    let visit = schedule(&fx, fx.team.id).await;
    let id = visit["id"].as_str().unwrap();

    let (status, second) = fx
        .as_user(
            &fx.admin,
            Method::POST,
            "/api/services",
            Some(json!({ "name": "Manutenção", "duration": 60 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = fx
        .as_user(
            &fx.seller,
            Method::PUT,
            &format!("/api/visits/{}", id),
            Some(json!({ "serviceIds": [second["id"]] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let services = body["services"].as_array().unwrap();
    assert_eq!(services.len(), 1);
    assert_eq!(services[0]["id"], second["id"]);

    let (status, body) = fx
        .as_user(
            &fx.seller,
            Method::PUT,
            &format!("/api/visits/{}", id),
            Some(json!({ "serviceIds": [] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["services"].as_array().unwrap().is_empty());

    // Omitting serviceIds leaves the set alone
    fx.as_user(
        &fx.seller,
        Method::PUT,
        &format!("/api/visits/{}", id),
        Some(json!({ "serviceIds": [fx.service.id] })),
    )
    .await;
    let (_, body) = fx
        .as_user(
            &fx.seller,
            Method::PUT,
            &format!("/api/visits/{}", id),
            Some(json!({ "title": "Revisão" })),
        )
        .await;
    assert_eq!(body["services"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_cancel_completed_visit_conflicts() {
    let fx = Fixture::new().await;
    let visit = schedule(&fx, fx.team.id).await;
    let id = visit["id"].as_str().unwrap();

    let (status, _) = fx
        .as_user(
            &fx.field,
            Method::PUT,
            &format!("/api/visits/{}/complete", id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = fx
        .as_user(&fx.seller, Method::DELETE, &format!("/api/visits/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = fx
        .as_user(&fx.admin, Method::GET, &format!("/api/visits/{}", id), None)
        .await;
    assert_eq!(body["status"], "COMPLETED");
}
