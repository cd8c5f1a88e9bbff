//! Repository for the `targets` table.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::target::{Target, TargetListQuery};

/// Column list for `targets` joined with `urls`.
const COLUMNS: &str = "\
    t.id, t.uuid, t.name, t.url_id, u.url, t.provider, t.stage, \
    t.worker_function, t.created_at, t.updated_at";

/// Maximum page size for target listing.
const MAX_LIMIT: i64 = 500;

/// Default page size for target listing.
const DEFAULT_LIMIT: i64 = 100;

pub struct TargetRepo;

impl TargetRepo {
    /// Find a live target by its external uuid.
    pub async fn find_by_uuid(pool: &PgPool, uuid: Uuid) -> Result<Option<Target>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM targets t JOIN urls u ON u.id = t.url_id \
             WHERE t.uuid = $1 AND t.deleted_at IS NULL"
        );
        sqlx::query_as::<_, Target>(&query)
            .bind(uuid)
            .fetch_optional(pool)
            .await
    }

    /// List live targets, newest first.
    pub async fn list(pool: &PgPool, params: &TargetListQuery) -> Result<Vec<Target>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = params.offset.unwrap_or(0).max(0);
        let query = format!(
            "SELECT {COLUMNS} FROM targets t JOIN urls u ON u.id = t.url_id \
             WHERE t.deleted_at IS NULL \
             ORDER BY t.created_at DESC, t.id DESC \
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Target>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
