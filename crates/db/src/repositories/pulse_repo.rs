//! Repository for the `pulses` table.
//!
//! A pulse and its two heartbeats are always written together in one
//! transaction, so no reader ever observes a pulse missing a viewport.

use autobahn_core::types::ExecutionId;
use autobahn_core::viewport::Viewport;
use sqlx::PgPool;

use crate::models::pulse::{CreatePulse, Pulse, PulseWithHeartbeats};
use crate::repositories::{HeartbeatRepo, UrlRepo};

/// Column list for `pulses` joined with `urls` (aliased `p` and `u`).
const COLUMNS: &str = "\
    p.id, p.uuid, p.url_id, u.url, p.team_id, p.target_id, p.schedule_id, \
    p.membership_id, p.triggered_by, p.provider, p.stage, \
    p.created_at, p.updated_at";

pub struct PulseRepo;

impl PulseRepo {
    /// Create a pulse with one pending heartbeat per viewport.
    ///
    /// The URL row is found or created inside the same transaction. Nothing
    /// is committed unless every row was written.
    pub async fn create_with_heartbeats(
        pool: &PgPool,
        input: &CreatePulse,
    ) -> Result<PulseWithHeartbeats, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let url = UrlRepo::find_or_create(&mut *tx, &input.url).await?;

        let insert_query = format!(
            "WITH p AS ( \
                 INSERT INTO pulses \
                     (uuid, url_id, team_id, target_id, membership_id, triggered_by, provider, stage) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
                 RETURNING * \
             ) \
             SELECT {COLUMNS} FROM p JOIN urls u ON u.id = p.url_id"
        );
        let pulse = sqlx::query_as::<_, Pulse>(&insert_query)
            .bind(input.execution_id)
            .bind(url.id)
            .bind(input.team_id)
            .bind(input.target_id)
            .bind(input.membership_id)
            .bind(&input.triggered_by)
            .bind(input.provider)
            .bind(input.stage)
            .fetch_one(&mut *tx)
            .await?;

        let mut heartbeats = Vec::with_capacity(Viewport::ALL.len());
        for viewport in Viewport::ALL {
            heartbeats.push(HeartbeatRepo::create(&mut *tx, pulse.id, viewport).await?);
        }

        tx.commit().await?;
        Ok(PulseWithHeartbeats { pulse, heartbeats })
    }

    /// Find a live pulse by its execution id.
    pub async fn find_by_execution_id(
        pool: &PgPool,
        execution_id: ExecutionId,
    ) -> Result<Option<Pulse>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM pulses p JOIN urls u ON u.id = p.url_id \
             WHERE p.uuid = $1 AND p.deleted_at IS NULL"
        );
        sqlx::query_as::<_, Pulse>(&query)
            .bind(execution_id)
            .fetch_optional(pool)
            .await
    }

    /// Find a live pulse and all of its heartbeats.
    pub async fn find_with_heartbeats(
        pool: &PgPool,
        execution_id: ExecutionId,
    ) -> Result<Option<PulseWithHeartbeats>, sqlx::Error> {
        match Self::find_by_execution_id(pool, execution_id).await? {
            Some(pulse) => {
                let heartbeats = HeartbeatRepo::list_by_pulse(pool, pulse.id).await?;
                Ok(Some(PulseWithHeartbeats { pulse, heartbeats }))
            }
            None => Ok(None),
        }
    }

    /// Soft-delete a pulse. Returns `false` if it was already deleted.
    pub async fn soft_delete(
        pool: &PgPool,
        execution_id: ExecutionId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE pulses SET deleted_at = NOW(), updated_at = NOW() \
             WHERE uuid = $1 AND deleted_at IS NULL",
        )
        .bind(execution_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
