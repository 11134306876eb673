//! Shared fixtures for the HTTP integration tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use fieldops_api::{ApiServer, ApiServerConfig};
use fieldops_auth::{hash_password, TokenIssuer};
use fieldops_core::{Role, VisitStatus};
use fieldops_db::entities::{client, service, team, user, visit};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde_json::Value;
use tower::ServiceExt; // For `oneshot` method
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-secret";
pub const PASSWORD: &str = "SecurePassword123!";

/// Seeded database plus a router over it
pub struct Fixture {
    pub db: DatabaseConnection,
    pub app: Router,
    pub admin: user::Model,
    pub seller: user::Model,
    /// Field team member of `team`
    pub field: user::Model,
    /// Field team member of `other_team`
    pub outsider: user::Model,
    pub team: team::Model,
    pub other_team: team::Model,
    pub client: client::Model,
    pub service: service::Model,
}

impl Fixture {
    pub async fn new() -> Self {
        let db = fieldops_db::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        fieldops_db::migrate(&db)
            .await
            .expect("Failed to run migrations");

        let password_hash = hash_password(PASSWORD).expect("Failed to hash password");

        let team = insert_team(&db, "Equipe Norte").await;
        let other_team = insert_team(&db, "Equipe Sul").await;

        let admin = insert_user(&db, "admin@example.com", Role::Admin, None, &password_hash).await;
        let seller =
            insert_user(&db, "seller@example.com", Role::Seller, None, &password_hash).await;
        let field = insert_user(
            &db,
            "field@example.com",
            Role::FieldTeam,
            Some(team.id),
            &password_hash,
        )
        .await;
        let outsider = insert_user(
            &db,
            "outsider@example.com",
            Role::FieldTeam,
            Some(other_team.id),
            &password_hash,
        )
        .await;

        let client = insert_client(&db, "Padaria Central").await;
        let service = insert_service(&db, "Instalação", 90).await;

        let config = ApiServerConfig::new("127.0.0.1:0".parse().unwrap(), JWT_SECRET);
        let app = ApiServer::new(config, db.clone()).build_router();

        Self {
            db,
            app,
            admin,
            seller,
            field,
            outsider,
            team,
            other_team,
            client,
            service,
        }
    }

    /// Session token for a seeded identity, signed with the server's secret
    pub fn token_for(&self, user: &user::Model) -> String {
        let role: Role = user.role.into();
        let (token, _) = TokenIssuer::new(JWT_SECRET.as_bytes(), Duration::hours(1))
            .issue(&user.id.to_string(), role.as_str())
            .expect("Failed to issue token");
        token
    }

    /// Send a request and decode the JSON body (`Value::Null` when empty)
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().uri(uri).method(method);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!(
                    "Non-JSON body ({}): {}",
                    status,
                    String::from_utf8_lossy(&bytes)
                )
            })
        };

        (status, json)
    }

    pub async fn as_user(
        &self,
        user: &user::Model,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let token = self.token_for(user);
        self.send(method, uri, Some(&token), body).await
    }

    /// Insert a visit for `team_id` directly, bypassing the lifecycle rules
    pub async fn insert_visit(
        &self,
        title: &str,
        team_id: Uuid,
        status: VisitStatus,
        start_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
    ) -> visit::Model {
        let now = Utc::now();
        visit::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title.to_string()),
            description: Set(None),
            date: Set(start_time),
            start_time: Set(start_time),
            end_time: Set(end_time),
            status: Set(status.into()),
            location: Set(None),
            notes: Set(None),
            image_url: Set(None),
            client_id: Set(self.client.id),
            team_id: Set(team_id),
            created_by_id: Set(self.admin.id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .expect("Failed to insert visit")
    }
}

async fn insert_team(db: &DatabaseConnection, name: &str) -> team::Model {
    let now = Utc::now();
    team::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("Failed to insert team")
}

async fn insert_user(
    db: &DatabaseConnection,
    email: &str,
    role: Role,
    team_id: Option<Uuid>,
    password_hash: &str,
) -> user::Model {
    let now = Utc::now();
    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(email.split('@').next().unwrap_or(email).to_string()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash.to_string()),
        role: Set(role.into()),
        team_id: Set(team_id),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("Failed to insert user")
}

async fn insert_client(db: &DatabaseConnection, name: &str) -> client::Model {
    let now = Utc::now();
    client::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        address: Set(Some("Rua das Flores, 10".to_string())),
        city: Set(Some("Campinas".to_string())),
        state: Set(Some("SP".to_string())),
        zip_code: Set(None),
        phone: Set(None),
        email: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("Failed to insert client")
}

async fn insert_service(db: &DatabaseConnection, name: &str, duration: i32) -> service::Model {
    let now = Utc::now();
    service::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        description: Set(None),
        duration: Set(duration),
        price: Set(Some(150.0)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("Failed to insert service")
}
