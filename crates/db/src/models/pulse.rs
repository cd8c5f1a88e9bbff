//! Pulse entity models: one logical audit execution spanning both viewports.

use autobahn_core::types::{DbId, ExecutionId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use super::heartbeat::Heartbeat;

/// A row from the `pulses` table joined with its URL.
///
/// Created once, never mutated afterwards except soft-deletion.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Pulse {
    pub id: DbId,
    #[sqlx(rename = "uuid")]
    #[serde(rename = "uuid")]
    pub execution_id: ExecutionId,
    pub url_id: DbId,
    pub url: String,
    /// Team that owns the execution; keys its connection-directory record.
    pub team_id: DbId,
    pub target_id: Option<DbId>,
    pub schedule_id: Option<DbId>,
    pub membership_id: Option<DbId>,
    /// Username of the caller that triggered the execution.
    pub triggered_by: Option<String>,
    pub provider: i16,
    pub stage: i16,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert DTO for a pulse. The URL is found or created by address.
#[derive(Debug, Clone)]
pub struct CreatePulse {
    pub execution_id: ExecutionId,
    pub url: String,
    pub team_id: DbId,
    pub target_id: Option<DbId>,
    pub membership_id: Option<DbId>,
    pub triggered_by: Option<String>,
    pub provider: i16,
    pub stage: i16,
}

/// A pulse together with its heartbeats, ordered by mode.
#[derive(Debug, Clone, Serialize)]
pub struct PulseWithHeartbeats {
    #[serde(flatten)]
    pub pulse: Pulse,
    pub heartbeats: Vec<Heartbeat>,
}
