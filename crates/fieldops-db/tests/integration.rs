//! Integration tests for fieldops-db
//!
//! Runs against a real SQLite in-memory database

use chrono::{TimeZone, Utc};
use fieldops_core::{Role, VisitStatus};
use fieldops_db::entities::{client, service, team, user, visit, visit_service};
use fieldops_db::{connect, membership, migrate};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, LoaderTrait,
    PaginatorTrait, QueryFilter, Set,
};
use uuid::Uuid;

async fn setup_test_db() -> DatabaseConnection {
    let db = connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    migrate(&db).await.expect("Failed to run migrations");

    db
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
) -> user::Model {
    let now = Utc::now();
    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(email.split('@').next().unwrap_or(email).to_string()),
        email: Set(email.to_string()),
        password_hash: Set("$argon2id$v=19$placeholder".to_string()),
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

#[tokio::test]
async fn test_database_connection() {
    let db = connect("sqlite::memory:").await.expect("Failed to connect");

    let backend = db.get_database_backend();
    assert!(matches!(backend, sea_orm::DatabaseBackend::Sqlite));
}

#[tokio::test]
async fn test_migrations_run_successfully() {
    let db = connect("sqlite::memory:").await.expect("Failed to connect");

    let result = migrate(&db).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_role_stored_and_read_back() {
    let db = setup_test_db().await;

    let created = insert_user(&db, "campo@example.com", Role::FieldTeam, None).await;
    let loaded = user::Entity::find_by_id(created.id)
        .one(&db)
        .await
        .unwrap()
        .expect("user should exist");

    assert_eq!(loaded.role, user::UserRole::FieldTeam);
    assert_eq!(Role::from(loaded.role), Role::FieldTeam);
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let db = setup_test_db().await;

    insert_user(&db, "dup@example.com", Role::Seller, None).await;

    let now = Utc::now();
    let result = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Other".to_string()),
        email: Set("dup@example.com".to_string()),
        password_hash: Set("x".to_string()),
        role: Set(user::UserRole::Seller),
        team_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&db)
    .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_team_of_follows_membership() {
    let db = setup_test_db().await;

    let alpha = insert_team(&db, "Equipe Alpha").await;
    let member = insert_user(&db, "alpha@example.com", Role::FieldTeam, Some(alpha.id)).await;
    let loner = insert_user(&db, "solo@example.com", Role::FieldTeam, None).await;

    assert_eq!(membership::team_of(&db, member.id).await.unwrap(), Some(alpha.id));
    assert_eq!(membership::team_of(&db, loner.id).await.unwrap(), None);
    assert_eq!(membership::team_of(&db, Uuid::new_v4()).await.unwrap(), None);
}

#[tokio::test]
async fn test_replace_members_sets_exact_membership() {
    let db = setup_test_db().await;

    let alpha = insert_team(&db, "Equipe Alpha").await;
    let a = insert_user(&db, "a@example.com", Role::FieldTeam, Some(alpha.id)).await;
    let b = insert_user(&db, "b@example.com", Role::FieldTeam, Some(alpha.id)).await;
    let c = insert_user(&db, "c@example.com", Role::FieldTeam, None).await;

    membership::replace_members(&db, alpha.id, &[b.id, c.id])
        .await
        .unwrap();

    let mut ids: Vec<Uuid> = membership::members_of(&db, alpha.id)
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.id)
        .collect();
    ids.sort();
    let mut expected = vec![b.id, c.id];
    expected.sort();

    assert_eq!(ids, expected);
    assert_eq!(membership::team_of(&db, a.id).await.unwrap(), None);
}

#[tokio::test]
async fn test_add_members_moves_between_teams() {
    let db = setup_test_db().await;

    let alpha = insert_team(&db, "Equipe Alpha").await;
    let beta = insert_team(&db, "Equipe Beta").await;
    let worker = insert_user(&db, "w@example.com", Role::FieldTeam, Some(alpha.id)).await;

    membership::add_members(&db, beta.id, &[worker.id])
        .await
        .unwrap();

    assert_eq!(membership::team_of(&db, worker.id).await.unwrap(), Some(beta.id));
    assert_eq!(membership::members_of(&db, alpha.id).await.unwrap().len(), 0);
    assert_eq!(membership::members_of(&db, beta.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_detach_all_clears_membership() {
    let db = setup_test_db().await;

    let alpha = insert_team(&db, "Equipe Alpha").await;
    insert_user(&db, "a@example.com", Role::FieldTeam, Some(alpha.id)).await;
    insert_user(&db, "b@example.com", Role::FieldTeam, Some(alpha.id)).await;

    let detached = membership::detach_all(&db, alpha.id).await.unwrap();

    assert_eq!(detached, 2);
    assert_eq!(membership::members_of(&db, alpha.id).await.unwrap().len(), 0);
}

#[tokio::test]
async fn test_unknown_users_reports_missing_ids() {
    let db = setup_test_db().await;

    let known = insert_user(&db, "k@example.com", Role::Seller, None).await;
    let ghost = Uuid::new_v4();

    let missing = membership::unknown_users(&db, &[known.id, ghost])
        .await
        .unwrap();

    assert_eq!(missing, vec![ghost]);
    assert!(membership::unknown_users(&db, &[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_visit_with_services() {
    let db = setup_test_db().await;

    let alpha = insert_team(&db, "Equipe Alpha").await;
    let seller = insert_user(&db, "seller@example.com", Role::Seller, None).await;
    let acme = insert_client(&db, "ACME").await;
    let install = insert_service(&db, "Instalação", 120).await;
    let inspect = insert_service(&db, "Vistoria", 30).await;

    let now = Utc::now();
    let day = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();
    let created = visit::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set("Instalação de equipamento".to_string()),
        description: Set(None),
        date: Set(day),
        start_time: Set(Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()),
        end_time: Set(None),
        status: Set(VisitStatus::INITIAL.into()),
        location: Set(None),
        notes: Set(None),
        image_url: Set(None),
        client_id: Set(acme.id),
        team_id: Set(alpha.id),
        created_by_id: Set(seller.id),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&db)
    .await
    .expect("Failed to insert visit");

    for service_id in [install.id, inspect.id] {
        visit_service::ActiveModel {
            visit_id: Set(created.id),
            service_id: Set(service_id),
        }
        .insert(&db)
        .await
        .expect("Failed to link service");
    }

    assert_eq!(created.lifecycle_status(), VisitStatus::Scheduled);

    let visits = visit::Entity::find()
        .filter(visit::Column::TeamId.eq(alpha.id))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(visits.len(), 1);

    let services = visits
        .load_many_to_many(service::Entity, visit_service::Entity, &db)
        .await
        .unwrap();
    assert_eq!(services[0].len(), 2);

    let clients = visits.load_one(client::Entity, &db).await.unwrap();
    assert_eq!(clients[0].as_ref().map(|c| c.name.as_str()), Some("ACME"));

    let scheduled = visit::Entity::find()
        .filter(visit::Column::Status.eq(visit::VisitState::Scheduled))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(scheduled, 1);
}
