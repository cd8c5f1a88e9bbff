//! Monitoring configuration rows.

use autobahn_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `targets` table joined with its URL.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Target {
    pub id: DbId,
    pub uuid: Uuid,
    pub name: String,
    pub url_id: DbId,
    pub url: String,
    pub provider: i16,
    pub stage: i16,
    /// Optional reference to the worker function that audits this target.
    pub worker_function: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Query parameters for `GET /api/v1/targets`.
#[derive(Debug, Default, Deserialize)]
pub struct TargetListQuery {
    /// Maximum number of results. Defaults to 100, capped at 500.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}
