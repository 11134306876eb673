//! Domain rules for the fieldops scheduling service
//!
//! Everything in this crate is pure: no database handles, no clocks other
//! than values passed in by the caller. The HTTP layer resolves identities
//! and records, then asks these modules what is allowed and what the new
//! state should be.

pub mod calendar;
pub mod error;
pub mod lifecycle;
pub mod policy;
pub mod report;

pub use error::CoreError;
pub use lifecycle::{
    plan_cancellation, plan_completion, plan_creation, plan_update, visit_scope, Completion,
    Transition, VisitPatch, VisitScope, VisitSnapshot, VisitStatus,
};
pub use policy::{authorize, can, Action, Caller, Decision, Resource, Role};
pub use report::{
    hours_between, hours_by_team, CompletedVisit, StatusCounts, TeamHours, VisitHours,
};
