use autobahn_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub sub: String,
    pub email: String,
    pub name: String,
    pub last_name: String,
    pub created_at: Timestamp,
}
