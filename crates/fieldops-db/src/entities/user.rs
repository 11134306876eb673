//! Identity entity: login credentials, role and team membership

use fieldops_core::Role;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stored role; mirrors [`fieldops_core::Role`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum UserRole {
    #[sea_orm(string_value = "ADMIN")]
    Admin,

    #[sea_orm(string_value = "SELLER")]
    Seller,

    #[sea_orm(string_value = "FIELD_TEAM")]
    FieldTeam,
}

impl From<UserRole> for Role {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Admin => Role::Admin,
            UserRole::Seller => Role::Seller,
            UserRole::FieldTeam => Role::FieldTeam,
        }
    }
}

impl From<Role> for UserRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => UserRole::Admin,
            Role::Seller => UserRole::Seller,
            Role::FieldTeam => UserRole::FieldTeam,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,

    /// Login email (unique)
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    pub role: UserRole,

    /// Team this identity works in; at most one
    pub team_id: Option<Uuid>,

    pub created_at: ChronoDateTimeUtc,

    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::team::Entity",
        from = "Column::TeamId",
        to = "super::team::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Team,

    /// Visits this identity created
    #[sea_orm(has_many = "super::visit::Entity")]
    CreatedVisits,
}

impl Related<super::team::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Team.def()
    }
}

impl Related<super::visit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CreatedVisits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
