//! Team membership queries
//!
//! Membership is stored on the identity row (`users.team_id`), so an
//! identity belongs to at most one team. These helpers answer both
//! directions: the team of an identity, and the identities of a team.

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder};
use tracing::debug;
use uuid::Uuid;

use crate::entities::user;

/// Team the identity currently belongs to
///
/// Read per request so role or team changes apply to existing sessions.
pub async fn team_of<C>(db: &C, user_id: Uuid) -> Result<Option<Uuid>, DbErr>
where
    C: ConnectionTrait,
{
    Ok(user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .and_then(|user| user.team_id))
}

/// Members of a team, ordered by name
pub async fn members_of<C>(db: &C, team_id: Uuid) -> Result<Vec<user::Model>, DbErr>
where
    C: ConnectionTrait,
{
    user::Entity::find()
        .filter(user::Column::TeamId.eq(team_id))
        .order_by_asc(user::Column::Name)
        .all(db)
        .await
}

/// Ids from `user_ids` that match no identity
pub async fn unknown_users<C>(db: &C, user_ids: &[Uuid]) -> Result<Vec<Uuid>, DbErr>
where
    C: ConnectionTrait,
{
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }

    let found: Vec<Uuid> = user::Entity::find()
        .filter(user::Column::Id.is_in(user_ids.to_vec()))
        .all(db)
        .await?
        .into_iter()
        .map(|user| user.id)
        .collect();

    Ok(user_ids
        .iter()
        .filter(|id| !found.contains(id))
        .copied()
        .collect())
}

/// Move the given identities into `team_id`, leaving other members in place
pub async fn add_members<C>(db: &C, team_id: Uuid, user_ids: &[Uuid]) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    if user_ids.is_empty() {
        return Ok(());
    }

    let result = user::Entity::update_many()
        .col_expr(user::Column::TeamId, Expr::value(Some(team_id)))
        .filter(user::Column::Id.is_in(user_ids.to_vec()))
        .exec(db)
        .await?;

    debug!(
        "Added {} member(s) to team {}",
        result.rows_affected, team_id
    );
    Ok(())
}

/// Make `user_ids` the exact member set of `team_id`
pub async fn replace_members<C>(db: &C, team_id: Uuid, user_ids: &[Uuid]) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    user::Entity::update_many()
        .col_expr(user::Column::TeamId, Expr::value(Option::<Uuid>::None))
        .filter(user::Column::TeamId.eq(team_id))
        .filter(user::Column::Id.is_not_in(user_ids.to_vec()))
        .exec(db)
        .await?;

    add_members(db, team_id, user_ids).await
}

/// Clear the membership of every identity in `team_id`
pub async fn detach_all<C>(db: &C, team_id: Uuid) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    let result = user::Entity::update_many()
        .col_expr(user::Column::TeamId, Expr::value(Option::<Uuid>::None))
        .filter(user::Column::TeamId.eq(team_id))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}
