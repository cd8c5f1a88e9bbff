//! Repository for the `memberships` table.

use autobahn_core::types::DbId;
use sqlx::PgPool;

use crate::models::membership::Membership;

const COLUMNS: &str = "m.id, m.user_id, m.team_id, t.name AS team_name, m.role";

pub struct MembershipRepo;

impl MembershipRepo {
    /// Find the membership linking the user with subject `sub` to `team_id`.
    pub async fn find_for_subject_in_team(
        pool: &PgPool,
        sub: &str,
        team_id: DbId,
    ) -> Result<Option<Membership>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM memberships m \
             JOIN users u ON u.id = m.user_id \
             JOIN teams t ON t.id = m.team_id \
             WHERE u.sub = $1 AND m.team_id = $2 \
               AND u.deleted_at IS NULL AND t.deleted_at IS NULL"
        );
        sqlx::query_as::<_, Membership>(&query)
            .bind(sub)
            .bind(team_id)
            .fetch_optional(pool)
            .await
    }

    /// List every live team membership of the user with subject `sub`.
    pub async fn list_for_subject(
        pool: &PgPool,
        sub: &str,
    ) -> Result<Vec<Membership>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM memberships m \
             JOIN users u ON u.id = m.user_id \
             JOIN teams t ON t.id = m.team_id \
             WHERE u.sub = $1 AND u.deleted_at IS NULL AND t.deleted_at IS NULL \
             ORDER BY t.name"
        );
        sqlx::query_as::<_, Membership>(&query)
            .bind(sub)
            .fetch_all(pool)
            .await
    }
}
