//! Monitored address rows.

use autobahn_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `urls` table. Immutable once created except soft-deletion.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Url {
    pub id: DbId,
    pub url: String,
    pub uuid: Uuid,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
