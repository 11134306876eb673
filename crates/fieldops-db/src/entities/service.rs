//! Service catalog entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "services")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,

    pub description: Option<String>,

    /// Expected duration in minutes
    pub duration: i32,

    pub price: Option<f64>,

    pub created_at: ChronoDateTimeUtc,

    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::visit_service::Entity")]
    VisitServices,
}

impl Related<super::visit_service::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VisitServices.def()
    }
}

impl Related<super::visit::Entity> for Entity {
    fn to() -> RelationDef {
        super::visit_service::Relation::Visit.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::visit_service::Relation::Service.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
