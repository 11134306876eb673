//! First administrator provisioning

use anyhow::{Context, Result};
use chrono::Utc;
use fieldops_auth::hash_password;
use fieldops_db::entities::user;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::info;
use uuid::Uuid;

/// Administrator credentials supplied at start-up
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
    /// Defaults to the local part of the email
    pub name: Option<String>,
}

/// Create the administrator unless an identity with that email exists
///
/// Returns `true` when a new identity was written.
pub async fn ensure_admin(db: &DatabaseConnection, seed: AdminSeed) -> Result<bool> {
    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&seed.email))
        .one(db)
        .await
        .context("Failed to check for existing admin user")?;

    if existing.is_some() {
        info!("Admin user already exists: {}", seed.email);
        return Ok(false);
    }

    let password_hash = hash_password(&seed.password).context("Failed to hash admin password")?;
    let name = seed
        .name
        .unwrap_or_else(|| seed.email.split('@').next().unwrap_or("admin").to_string());
    let now = Utc::now();

    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.clone()),
        email: Set(seed.email.clone()),
        password_hash: Set(password_hash),
        role: Set(user::UserRole::Admin),
        team_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .context("Failed to create admin user")?;

    info!("Admin user created: {} ({})", name, seed.email);
    Ok(true)
}
