//! Team membership rows.

use autobahn_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// A membership joined with the team it grants access to.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Membership {
    pub id: DbId,
    pub user_id: DbId,
    pub team_id: DbId,
    pub team_name: String,
    pub role: i16,
}
