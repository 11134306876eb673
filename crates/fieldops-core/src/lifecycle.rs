//! Visit lifecycle
//!
//! ```text
//!   SCHEDULED <-> IN_PROGRESS        (general update)
//!       |             |
//!       +------+------+
//!              |
//!       complete / cancel
//!              v
//!   COMPLETED      CANCELLED        (terminal)
//! ```
//!
//! Every status change goes through [`VisitStatus::apply`]. The `plan_*`
//! functions combine the policy check with the transition check and return
//! exactly what the store should write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::error::CoreError;
use crate::policy::{authorize, can, Action, Caller, Resource, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisitStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl VisitStatus {
    /// Status of every newly created visit
    pub const INITIAL: VisitStatus = VisitStatus::Scheduled;

    pub const fn as_str(self) -> &'static str {
        match self {
            VisitStatus::Scheduled => "SCHEDULED",
            VisitStatus::InProgress => "IN_PROGRESS",
            VisitStatus::Completed => "COMPLETED",
            VisitStatus::Cancelled => "CANCELLED",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, VisitStatus::Completed | VisitStatus::Cancelled)
    }

    /// Validate a transition and return the resulting status
    pub fn apply(self, transition: Transition) -> Result<VisitStatus, CoreError> {
        let target = transition.target();

        // Restating the current status is not a change
        if let Transition::Set(status) = transition {
            if status == self {
                return Ok(self);
            }
        }

        let legal = !self.is_terminal()
            && match transition {
                Transition::Set(status) => !status.is_terminal(),
                Transition::Complete | Transition::Cancel => true,
            };

        if legal {
            Ok(target)
        } else {
            Err(CoreError::InvalidTransition {
                from: self,
                to: target,
            })
        }
    }
}

impl fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisitStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SCHEDULED" => Ok(VisitStatus::Scheduled),
            "IN_PROGRESS" => Ok(VisitStatus::InProgress),
            "COMPLETED" => Ok(VisitStatus::Completed),
            "CANCELLED" => Ok(VisitStatus::Cancelled),
            other => Err(CoreError::Validation(format!(
                "Unknown visit status '{}'",
                other
            ))),
        }
    }
}

/// A requested status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Status written through the general update; only non-terminal targets
    Set(VisitStatus),
    /// The dedicated complete action
    Complete,
    /// The dedicated cancel action
    Cancel,
}

impl Transition {
    pub const fn target(self) -> VisitStatus {
        match self {
            Transition::Set(status) => status,
            Transition::Complete => VisitStatus::Completed,
            Transition::Cancel => VisitStatus::Cancelled,
        }
    }
}

/// The parts of a stored visit the lifecycle rules look at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitSnapshot {
    pub status: VisitStatus,
    pub team_id: Uuid,
    pub notes: Option<String>,
    pub image_url: Option<String>,
}

/// Partial update of a visit; `None` leaves the field untouched
///
/// Nullable text fields use `Option<Option<_>>` so that an explicit `null`
/// clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisitPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub date: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: Option<VisitStatus>,
    pub location: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub image_url: Option<Option<String>>,
    pub client_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    /// Replaces the full service set when present
    pub service_ids: Option<Vec<Uuid>>,
}

/// Field values written by the complete action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub status: VisitStatus,
    pub end_time: DateTime<Utc>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
}

/// Which visits a list request may return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitScope {
    Unrestricted,
    Team(Uuid),
    /// Field team member without a team: sees nothing
    Empty,
}

/// Check the caller may create visits and return the initial status
pub fn plan_creation(caller: &Caller) -> Result<VisitStatus, CoreError> {
    authorize(caller, Action::CreateVisit, Resource::None)?;
    Ok(VisitStatus::INITIAL)
}

/// Authorize a general update and strip what the caller may not change
///
/// A team reassignment from a caller without the privilege is dropped
/// silently; the remaining fields still apply.
pub fn plan_update(
    caller: &Caller,
    current: &VisitSnapshot,
    mut patch: VisitPatch,
) -> Result<VisitPatch, CoreError> {
    authorize(caller, Action::UpdateVisit, Resource::TeamVisit(current.team_id))?;

    if patch.team_id.is_some()
        && !can(caller, Action::ReassignVisitTeam, Resource::None).is_allowed()
    {
        debug!(user_id = %caller.id, "Ignoring team reassignment from unprivileged caller");
        patch.team_id = None;
    }

    if let Some(status) = patch.status {
        patch.status = Some(current.status.apply(Transition::Set(status))?);
    }

    Ok(patch)
}

/// Authorize and compute the complete action
///
/// Notes and image are overwritten only by non-empty values.
pub fn plan_completion(
    caller: &Caller,
    current: &VisitSnapshot,
    notes: Option<String>,
    image_url: Option<String>,
    now: DateTime<Utc>,
) -> Result<Completion, CoreError> {
    authorize(caller, Action::CompleteVisit, Resource::TeamVisit(current.team_id))?;
    let status = current.status.apply(Transition::Complete)?;

    Ok(Completion {
        status,
        end_time: now,
        notes: non_empty(notes).or_else(|| current.notes.clone()),
        image_url: non_empty(image_url).or_else(|| current.image_url.clone()),
    })
}

/// Authorize and compute the cancel action
pub fn plan_cancellation(
    caller: &Caller,
    current: &VisitSnapshot,
) -> Result<VisitStatus, CoreError> {
    authorize(caller, Action::CancelVisit, Resource::TeamVisit(current.team_id))?;
    current.status.apply(Transition::Cancel)
}

/// Resolve the team filter of a list request
///
/// Field team members are always pinned to their own team, whatever they
/// asked for.
pub fn visit_scope(caller: &Caller, requested_team: Option<Uuid>) -> VisitScope {
    match caller.role {
        Role::FieldTeam => caller.team_id.map_or(VisitScope::Empty, VisitScope::Team),
        Role::Admin | Role::Seller => {
            requested_team.map_or(VisitScope::Unrestricted, VisitScope::Team)
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
