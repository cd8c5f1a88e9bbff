//! Heartbeat entity models: one viewport-specific measurement attempt.

use autobahn_core::types::{DbId, Timestamp};
use autobahn_core::viewport::{ModeCode, Viewport};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::{HeartbeatStatus, StatusId};

/// A row from the `heartbeats` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Heartbeat {
    pub id: DbId,
    pub pulse_id: DbId,
    pub mode: ModeCode,
    /// Monotonically non-decreasing; only the retry operation bumps it.
    pub retries: i32,
    pub status: StatusId,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub metrics: HeartbeatMetrics,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub scores: HeartbeatScores,
    pub screenshots: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub ended_at: Option<Timestamp>,
}

impl Heartbeat {
    /// The viewport this heartbeat measures, if the stored code is valid.
    pub fn viewport(&self) -> Option<Viewport> {
        Viewport::from_code(self.mode)
    }

    pub fn status(&self) -> Option<HeartbeatStatus> {
        HeartbeatStatus::from_id(self.status)
    }
}

/// Timing metrics in milliseconds (CLS is unitless).
#[derive(Debug, Clone, Copy, Default, PartialEq, FromRow, Serialize, Deserialize)]
pub struct HeartbeatMetrics {
    /// Time to first byte.
    pub ttfb: f64,
    /// First contentful paint.
    pub fcp: f64,
    /// DOM content loaded.
    pub dcl: f64,
    /// Largest contentful paint.
    pub lcp: f64,
    /// Time to interactive.
    pub tti: f64,
    /// Speed index.
    pub si: f64,
    /// Cumulative layout shift.
    pub cls: f64,
}

/// Category scores, each within 0..=100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct HeartbeatScores {
    pub performance_score: i16,
    pub accessibility_score: i16,
    pub best_practices_score: i16,
    pub seo_score: i16,
}

impl HeartbeatScores {
    /// Whether every score lies within 0..=100.
    pub fn in_range(&self) -> bool {
        [
            self.performance_score,
            self.accessibility_score,
            self.best_practices_score,
            self.seo_score,
        ]
        .iter()
        .all(|s| (0..=100).contains(s))
    }
}

/// Terminal result reported by a worker for one heartbeat. `Pending` and
/// `Running` are refused before anything is written.
#[derive(Debug, Clone, Deserialize)]
pub struct HeartbeatResult {
    pub status: HeartbeatStatus,
    #[serde(default)]
    pub metrics: HeartbeatMetrics,
    #[serde(default)]
    pub scores: HeartbeatScores,
    pub screenshots: Option<serde_json::Value>,
}
