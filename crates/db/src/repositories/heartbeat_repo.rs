//! Repository for the `heartbeats` table.
//!
//! Two writers touch a heartbeat after creation and they never share a
//! column: [`increment_retries`](HeartbeatRepo::increment_retries) only
//! bumps `retries`, [`record_result`](HeartbeatRepo::record_result) only
//! writes status, metrics, scores, screenshots and `ended_at`.

use autobahn_core::types::DbId;
use autobahn_core::viewport::Viewport;
use sqlx::{PgConnection, PgPool};

use crate::models::heartbeat::{Heartbeat, HeartbeatResult};
use crate::models::status::HeartbeatStatus;

/// Column list for `heartbeats` queries.
const COLUMNS: &str = "\
    id, pulse_id, mode, retries, status, \
    ttfb, fcp, dcl, lcp, tti, si, cls, \
    performance_score, accessibility_score, best_practices_score, seo_score, \
    screenshots, created_at, updated_at, ended_at";

pub struct HeartbeatRepo;

impl HeartbeatRepo {
    /// Insert a pending heartbeat with zero retries.
    pub async fn create(
        conn: &mut PgConnection,
        pulse_id: DbId,
        viewport: Viewport,
    ) -> Result<Heartbeat, sqlx::Error> {
        let query = format!(
            "INSERT INTO heartbeats (pulse_id, mode, retries, status) \
             VALUES ($1, $2, 0, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Heartbeat>(&query)
            .bind(pulse_id)
            .bind(viewport.code())
            .bind(HeartbeatStatus::Pending.id())
            .fetch_one(conn)
            .await
    }

    /// All live heartbeats of a pulse, ordered by mode.
    pub async fn list_by_pulse(
        pool: &PgPool,
        pulse_id: DbId,
    ) -> Result<Vec<Heartbeat>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM heartbeats \
             WHERE pulse_id = $1 AND deleted_at IS NULL ORDER BY mode"
        );
        sqlx::query_as::<_, Heartbeat>(&query)
            .bind(pulse_id)
            .fetch_all(pool)
            .await
    }

    /// Keyed lookup of the heartbeat measuring `viewport` within a pulse.
    pub async fn find_by_mode(
        pool: &PgPool,
        pulse_id: DbId,
        viewport: Viewport,
    ) -> Result<Option<Heartbeat>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM heartbeats \
             WHERE pulse_id = $1 AND mode = $2 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, Heartbeat>(&query)
            .bind(pulse_id)
            .bind(viewport.code())
            .fetch_optional(pool)
            .await
    }

    /// Atomically add one to `retries` and return the updated row.
    ///
    /// The increment happens inside the UPDATE, so concurrent retries of the
    /// same heartbeat are all counted.
    pub async fn increment_retries(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Heartbeat>, sqlx::Error> {
        let query = format!(
            "UPDATE heartbeats SET retries = retries + 1, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Heartbeat>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Write a worker's result. Terminal statuses also stamp `ended_at`.
    pub async fn record_result(
        pool: &PgPool,
        id: DbId,
        result: &HeartbeatResult,
    ) -> Result<Option<Heartbeat>, sqlx::Error> {
        let query = format!(
            "UPDATE heartbeats SET \
                 status = $2, \
                 ttfb = $3, fcp = $4, dcl = $5, lcp = $6, tti = $7, si = $8, cls = $9, \
                 performance_score = $10, accessibility_score = $11, \
                 best_practices_score = $12, seo_score = $13, \
                 screenshots = $14, \
                 ended_at = CASE WHEN $15 THEN NOW() ELSE ended_at END, \
                 updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        let m = &result.metrics;
        let s = &result.scores;
        sqlx::query_as::<_, Heartbeat>(&query)
            .bind(id)
            .bind(result.status.id())
            .bind(m.ttfb)
            .bind(m.fcp)
            .bind(m.dcl)
            .bind(m.lcp)
            .bind(m.tti)
            .bind(m.si)
            .bind(m.cls)
            .bind(s.performance_score)
            .bind(s.accessibility_score)
            .bind(s.best_practices_score)
            .bind(s.seo_score)
            .bind(&result.screenshots)
            .bind(result.status.is_terminal())
            .fetch_optional(pool)
            .await
    }
}
