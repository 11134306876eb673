//! Database entities

pub mod client;
pub mod service;
pub mod team;
pub mod user;
pub mod visit;
pub mod visit_service;

pub use client::Entity as Client;
pub use service::Entity as Service;
pub use team::Entity as Team;
pub use user::Entity as User;
pub use visit::Entity as Visit;
pub use visit_service::Entity as VisitService;

pub mod prelude {
    pub use super::client::Entity as Client;
    pub use super::service::Entity as Service;
    pub use super::team::Entity as Team;
    pub use super::user::Entity as User;
    pub use super::visit::Entity as Visit;
    pub use super::visit_service::Entity as VisitService;
}
