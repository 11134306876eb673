//! Visit entity: one scheduled appointment of a team at a client

use fieldops_core::VisitStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stored lifecycle state; mirrors [`fieldops_core::VisitStatus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum VisitState {
    #[sea_orm(string_value = "SCHEDULED")]
    Scheduled,

    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,

    #[sea_orm(string_value = "COMPLETED")]
    Completed,

    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl From<VisitState> for VisitStatus {
    fn from(state: VisitState) -> Self {
        match state {
            VisitState::Scheduled => VisitStatus::Scheduled,
            VisitState::InProgress => VisitStatus::InProgress,
            VisitState::Completed => VisitStatus::Completed,
            VisitState::Cancelled => VisitStatus::Cancelled,
        }
    }
}

impl From<VisitStatus> for VisitState {
    fn from(status: VisitStatus) -> Self {
        match status {
            VisitStatus::Scheduled => VisitState::Scheduled,
            VisitStatus::InProgress => VisitState::InProgress,
            VisitStatus::Completed => VisitState::Completed,
            VisitStatus::Cancelled => VisitState::Cancelled,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "visits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub title: String,

    pub description: Option<String>,

    /// Calendar day the visit is booked on
    pub date: ChronoDateTimeUtc,

    pub start_time: ChronoDateTimeUtc,

    /// Set on completion
    pub end_time: Option<ChronoDateTimeUtc>,

    pub status: VisitState,

    pub location: Option<String>,

    pub notes: Option<String>,

    pub image_url: Option<String>,

    pub client_id: Uuid,

    pub team_id: Uuid,

    pub created_by_id: Uuid,

    pub created_at: ChronoDateTimeUtc,

    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Client,

    #[sea_orm(
        belongs_to = "super::team::Entity",
        from = "Column::TeamId",
        to = "super::team::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Team,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedById",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Creator,

    #[sea_orm(has_many = "super::visit_service::Entity")]
    VisitServices,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::team::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Team.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl Related<super::visit_service::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VisitServices.def()
    }
}

impl Related<super::service::Entity> for Entity {
    fn to() -> RelationDef {
        super::visit_service::Relation::Service.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::visit_service::Relation::Visit.def().rev())
    }
}

impl Model {
    pub fn lifecycle_status(&self) -> VisitStatus {
        self.status.into()
    }
}

impl ActiveModelBehavior for ActiveModel {}
