//! Repository for the `connection_directory` table.
//!
//! Rows map a subscriber group `(sub, kind)` to the ids of its live
//! WebSocket connections. Adds and removes are single atomic statements so
//! concurrent connects and disconnects of the same team do not lose ids.

use sqlx::PgPool;

use crate::models::connection::ConnectionRecord;

const COLUMNS: &str = "sub, kind, connections, updated_at";

pub struct ConnectionRepo;

impl ConnectionRepo {
    pub async fn find(
        pool: &PgPool,
        sub: &str,
        kind: &str,
    ) -> Result<Option<ConnectionRecord>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM connection_directory WHERE sub = $1 AND kind = $2");
        sqlx::query_as::<_, ConnectionRecord>(&query)
            .bind(sub)
            .bind(kind)
            .fetch_optional(pool)
            .await
    }

    /// Add `connection_id` to the record, creating it if needed.
    pub async fn add(
        pool: &PgPool,
        sub: &str,
        kind: &str,
        connection_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO connection_directory (sub, kind, connections) \
             VALUES ($1, $2, ARRAY[$3]) \
             ON CONFLICT (sub, kind) DO UPDATE \
             SET connections = CASE \
                     WHEN $3 = ANY(connection_directory.connections) \
                         THEN connection_directory.connections \
                     ELSE array_append(connection_directory.connections, $3) \
                 END, \
                 updated_at = NOW()",
        )
        .bind(sub)
        .bind(kind)
        .bind(connection_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Remove `connection_id` from the record. Returns `false` if it was
    /// not present.
    pub async fn remove(
        pool: &PgPool,
        sub: &str,
        kind: &str,
        connection_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE connection_directory \
             SET connections = array_remove(connections, $3), updated_at = NOW() \
             WHERE sub = $1 AND kind = $2 AND $3 = ANY(connections)",
        )
        .bind(sub)
        .bind(kind)
        .bind(connection_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Drop every record of `kind`. Returns the number of records removed.
    pub async fn clear_kind(pool: &PgPool, kind: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM connection_directory WHERE kind = $1")
            .bind(kind)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
