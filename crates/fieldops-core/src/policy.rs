//! Authorization policy
//!
//! A single decision function, [`can`], answers whether a [`Caller`] may
//! perform an [`Action`] on a [`Resource`]. Handlers never compare roles
//! themselves; they call [`authorize`] and propagate the error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::error::CoreError;

/// Role carried by every identity
///
/// Roles are not a strict hierarchy: a seller can cancel visits, a field
/// team member cannot, yet a field team member can complete a visit of
/// their own team while a seller cannot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Full access to every action
    Admin,
    /// Manages clients and visits
    Seller,
    /// Works visits assigned to their own team
    FieldTeam,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Seller => "SELLER",
            Role::FieldTeam => "FIELD_TEAM",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "SELLER" => Ok(Role::Seller),
            "FIELD_TEAM" => Ok(Role::FieldTeam),
            other => Err(CoreError::Validation(format!("Unknown role '{}'", other))),
        }
    }
}

/// The authenticated principal behind a request
///
/// `team_id` comes from the identity -> team reverse index and is only
/// meaningful for visit ownership checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: Uuid,
    pub role: Role,
    pub team_id: Option<Uuid>,
}

impl Caller {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self {
            id,
            role,
            team_id: None,
        }
    }

    pub fn with_team(mut self, team_id: Option<Uuid>) -> Self {
        self.team_id = team_id;
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_admin_or_seller(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Seller)
    }

    pub fn is_member_of(&self, team_id: Uuid) -> bool {
        self.team_id == Some(team_id)
    }
}

/// Every operation the policy knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ListUsers,
    ReadUser,
    CreateUser,
    UpdateUser,
    DeleteUser,
    /// Change the `role` field of an identity
    ChangeUserRole,
    /// Change the team reference of an identity
    AssignUserTeam,

    CreateTeam,
    UpdateTeam,
    DeleteTeam,

    CreateService,
    UpdateService,
    DeleteService,

    CreateClient,
    UpdateClient,
    DeleteClient,

    /// List or read clients, services, teams and visit collections
    Read,
    /// Read one visit; field team members only see their own team's visits
    ReadVisit,
    CreateVisit,
    UpdateVisit,
    /// Move a visit to another team
    ReassignVisitTeam,
    CompleteVisit,
    CancelVisit,

    ViewTeamReport,
    ViewHoursReport,
    ViewClientReport,
}

/// What the action targets, when ownership matters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    None,
    /// A specific identity record
    Identity(Uuid),
    /// A visit owned by the given team
    TeamVisit(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

/// Decide whether `caller` may perform `action` on `resource`
pub fn can(caller: &Caller, action: Action, resource: Resource) -> Decision {
    use Action::*;

    let owns_identity = matches!(resource, Resource::Identity(id) if id == caller.id);
    let in_owning_team = matches!(resource, Resource::TeamVisit(team) if caller.is_member_of(team));

    let allowed = match action {
        ListUsers | CreateUser | DeleteUser | ChangeUserRole | AssignUserTeam | CreateTeam
        | UpdateTeam | DeleteTeam | CreateService | UpdateService | DeleteService
        | DeleteClient | ViewTeamReport | ViewHoursReport => caller.is_admin(),

        CreateClient | UpdateClient | CreateVisit | CancelVisit | ReassignVisitTeam => {
            caller.is_admin_or_seller()
        }

        ReadUser | UpdateUser => caller.is_admin() || owns_identity,

        Read | ViewClientReport => true,

        ReadVisit => caller.role != Role::FieldTeam || in_owning_team,

        UpdateVisit => caller.is_admin_or_seller() || in_owning_team,

        CompleteVisit => caller.is_admin() || in_owning_team,
    };

    if allowed {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

/// Like [`can`] but yields a `Forbidden` error carrying a caller-facing message
pub fn authorize(caller: &Caller, action: Action, resource: Resource) -> Result<(), CoreError> {
    match can(caller, action, resource) {
        Decision::Allow => Ok(()),
        Decision::Deny => {
            warn!(
                user_id = %caller.id,
                role = %caller.role,
                ?action,
                "Authorization denied"
            );
            Err(CoreError::Forbidden(denial_message(action).to_string()))
        }
    }
}

fn denial_message(action: Action) -> &'static str {
    use Action::*;

    match action {
        ReadUser | UpdateUser => "Access denied",
        ChangeUserRole => "Only administrators can change a user's role",
        CreateClient | UpdateClient | CreateVisit | CancelVisit | ReassignVisitTeam => {
            "Access denied. Administrator or seller permission required."
        }
        ReadVisit => "You can only access visits assigned to your team",
        UpdateVisit => "Not allowed to edit this visit",
        CompleteVisit => "Not allowed to complete this visit",
        _ => "Access denied. Administrator permission required.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Caller {
        Caller::new(Uuid::new_v4(), Role::Admin)
    }

    fn seller() -> Caller {
        Caller::new(Uuid::new_v4(), Role::Seller)
    }

    fn field(team: Uuid) -> Caller {
        Caller::new(Uuid::new_v4(), Role::FieldTeam).with_team(Some(team))
    }

    #[test]
    fn test_role_string_round_trip() {
        for role in [Role::Admin, Role::Seller, Role::FieldTeam] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&Role::FieldTeam).unwrap();
        assert_eq!(json, "\"FIELD_TEAM\"");
    }

    #[test]
    fn test_admin_only_actions() {
        let team = Uuid::new_v4();
        let admin_only = [
            Action::ListUsers,
            Action::CreateUser,
            Action::DeleteUser,
            Action::CreateTeam,
            Action::UpdateTeam,
            Action::DeleteTeam,
            Action::CreateService,
            Action::UpdateService,
            Action::DeleteService,
            Action::DeleteClient,
            Action::ViewTeamReport,
            Action::ViewHoursReport,
            Action::ChangeUserRole,
            Action::AssignUserTeam,
        ];

        for action in admin_only {
            assert!(can(&admin(), action, Resource::None).is_allowed(), "{:?}", action);
            assert!(!can(&seller(), action, Resource::None).is_allowed(), "{:?}", action);
            assert!(!can(&field(team), action, Resource::None).is_allowed(), "{:?}", action);
        }
    }

    #[test]
    fn test_admin_or_seller_actions() {
        let team = Uuid::new_v4();
        for action in [
            Action::CreateClient,
            Action::UpdateClient,
            Action::CreateVisit,
            Action::CancelVisit,
            Action::ReassignVisitTeam,
        ] {
            assert!(can(&admin(), action, Resource::None).is_allowed());
            assert!(can(&seller(), action, Resource::None).is_allowed());
            assert!(!can(&field(team), action, Resource::TeamVisit(team)).is_allowed());
        }
    }

    #[test]
    fn test_self_or_admin_identity_access() {
        let me = seller();
        let other = Uuid::new_v4();

        assert!(can(&me, Action::ReadUser, Resource::Identity(me.id)).is_allowed());
        assert!(can(&me, Action::UpdateUser, Resource::Identity(me.id)).is_allowed());
        assert!(!can(&me, Action::ReadUser, Resource::Identity(other)).is_allowed());
        assert!(!can(&me, Action::UpdateUser, Resource::Identity(other)).is_allowed());
        assert!(can(&admin(), Action::UpdateUser, Resource::Identity(other)).is_allowed());

        // Updating one's own record still never grants a role change
        assert!(!can(&me, Action::ChangeUserRole, Resource::Identity(me.id)).is_allowed());
    }

    #[test]
    fn test_read_open_to_every_role() {
        let team = Uuid::new_v4();
        for caller in [admin(), seller(), field(team)] {
            assert!(can(&caller, Action::Read, Resource::None).is_allowed());
            assert!(can(&caller, Action::ViewClientReport, Resource::None).is_allowed());
        }
    }

    #[test]
    fn test_field_team_visit_visibility() {
        let mine = Uuid::new_v4();
        let theirs = Uuid::new_v4();
        let caller = field(mine);

        assert!(can(&caller, Action::ReadVisit, Resource::TeamVisit(mine)).is_allowed());
        assert!(!can(&caller, Action::ReadVisit, Resource::TeamVisit(theirs)).is_allowed());
        assert!(can(&seller(), Action::ReadVisit, Resource::TeamVisit(theirs)).is_allowed());

        let teamless = Caller::new(Uuid::new_v4(), Role::FieldTeam);
        assert!(!can(&teamless, Action::ReadVisit, Resource::TeamVisit(mine)).is_allowed());
    }

    #[test]
    fn test_update_visit_requires_privilege_or_membership() {
        let mine = Uuid::new_v4();
        let theirs = Uuid::new_v4();

        assert!(can(&field(mine), Action::UpdateVisit, Resource::TeamVisit(mine)).is_allowed());
        assert!(!can(&field(mine), Action::UpdateVisit, Resource::TeamVisit(theirs)).is_allowed());
        assert!(can(&seller(), Action::UpdateVisit, Resource::TeamVisit(theirs)).is_allowed());
        assert!(can(&admin(), Action::UpdateVisit, Resource::TeamVisit(theirs)).is_allowed());
    }

    #[test]
    fn test_complete_visit_excludes_non_member_sellers() {
        let team = Uuid::new_v4();

        assert!(can(&admin(), Action::CompleteVisit, Resource::TeamVisit(team)).is_allowed());
        assert!(can(&field(team), Action::CompleteVisit, Resource::TeamVisit(team)).is_allowed());
        assert!(!can(&seller(), Action::CompleteVisit, Resource::TeamVisit(team)).is_allowed());

        let member_seller = seller().with_team(Some(team));
        assert!(can(&member_seller, Action::CompleteVisit, Resource::TeamVisit(team)).is_allowed());
    }

    #[test]
    fn test_authorize_returns_forbidden() {
        let err = authorize(&seller(), Action::DeleteClient, Resource::None).unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
        assert!(authorize(&admin(), Action::DeleteClient, Resource::None).is_ok());
    }
}
