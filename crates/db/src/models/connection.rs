//! Connection-directory records.

use autobahn_core::types::Timestamp;
use serde::Serialize;
use sqlx::FromRow;

/// Directory kind under which a team's live WebSocket connections are kept.
pub const KIND_TEAM_CONNECTIONS: &str = "teamConnections";

/// A row from the `connection_directory` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ConnectionRecord {
    pub sub: String,
    pub kind: String,
    pub connections: Vec<String>,
    pub updated_at: Timestamp,
}
