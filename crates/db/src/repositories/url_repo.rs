//! Repository for the `urls` table.

use autobahn_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::url::Url;

/// Column list for `urls` queries.
const COLUMNS: &str = "id, url, uuid, created_at, updated_at";

pub struct UrlRepo;

impl UrlRepo {
    /// Return the live row for `address`, inserting it if none exists.
    ///
    /// Relies on the partial unique index `uq_urls_url_live`, so concurrent
    /// callers converge on a single row.
    pub async fn find_or_create(
        conn: &mut PgConnection,
        address: &str,
    ) -> Result<Url, sqlx::Error> {
        let query = format!(
            "INSERT INTO urls (url) VALUES ($1) \
             ON CONFLICT (url) WHERE deleted_at IS NULL \
             DO UPDATE SET url = EXCLUDED.url \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Url>(&query)
            .bind(address)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Url>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM urls WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Url>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a URL. Returns `false` if it was already deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE urls SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
