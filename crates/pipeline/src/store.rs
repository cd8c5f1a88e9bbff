//! System-of-record seam used by the orchestrator.

use async_trait::async_trait;
use autobahn_core::types::{DbId, ExecutionId};
use autobahn_core::viewport::Viewport;
use autobahn_db::models::heartbeat::{Heartbeat, HeartbeatResult};
use autobahn_db::models::pulse::{CreatePulse, Pulse, PulseWithHeartbeats};
use autobahn_db::models::target::Target;
use autobahn_db::repositories::{HeartbeatRepo, MembershipRepo, PulseRepo, TargetRepo};
use autobahn_db::DbPool;

use crate::error::StoreError;

/// Durable storage for pulses and heartbeats.
///
/// [`increment_retries`](ExecutionStore::increment_retries) must be an
/// atomic read-modify-write: concurrent calls for the same heartbeat each
/// add exactly one.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    async fn find_target(&self, uuid: uuid::Uuid) -> Result<Option<Target>, StoreError>;

    /// Membership id linking `subject` to `team_id`, if any.
    async fn find_membership(&self, subject: &str, team_id: DbId)
        -> Result<Option<DbId>, StoreError>;

    /// Write a pulse and one pending heartbeat per viewport, all or nothing.
    async fn create_execution(&self, input: &CreatePulse)
        -> Result<PulseWithHeartbeats, StoreError>;

    async fn find_pulse(&self, execution_id: ExecutionId) -> Result<Option<Pulse>, StoreError>;

    async fn find_heartbeat(
        &self,
        pulse_id: DbId,
        viewport: Viewport,
    ) -> Result<Option<Heartbeat>, StoreError>;

    async fn find_execution(
        &self,
        execution_id: ExecutionId,
    ) -> Result<Option<PulseWithHeartbeats>, StoreError>;

    async fn increment_retries(&self, heartbeat_id: DbId) -> Result<Option<Heartbeat>, StoreError>;

    async fn record_result(
        &self,
        heartbeat_id: DbId,
        result: &HeartbeatResult,
    ) -> Result<Option<Heartbeat>, StoreError>;
}

/// [`ExecutionStore`] over the Postgres repositories.
#[derive(Clone)]
pub struct PgExecutionStore {
    pool: DbPool,
}

impl PgExecutionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExecutionStore for PgExecutionStore {
    async fn find_target(&self, uuid: uuid::Uuid) -> Result<Option<Target>, StoreError> {
        Ok(TargetRepo::find_by_uuid(&self.pool, uuid).await?)
    }

    async fn find_membership(
        &self,
        subject: &str,
        team_id: DbId,
    ) -> Result<Option<DbId>, StoreError> {
        let membership =
            MembershipRepo::find_for_subject_in_team(&self.pool, subject, team_id).await?;
        Ok(membership.map(|m| m.id))
    }

    async fn create_execution(
        &self,
        input: &CreatePulse,
    ) -> Result<PulseWithHeartbeats, StoreError> {
        Ok(PulseRepo::create_with_heartbeats(&self.pool, input).await?)
    }

    async fn find_pulse(&self, execution_id: ExecutionId) -> Result<Option<Pulse>, StoreError> {
        Ok(PulseRepo::find_by_execution_id(&self.pool, execution_id).await?)
    }

    async fn find_heartbeat(
        &self,
        pulse_id: DbId,
        viewport: Viewport,
    ) -> Result<Option<Heartbeat>, StoreError> {
        Ok(HeartbeatRepo::find_by_mode(&self.pool, pulse_id, viewport).await?)
    }

    async fn find_execution(
        &self,
        execution_id: ExecutionId,
    ) -> Result<Option<PulseWithHeartbeats>, StoreError> {
        Ok(PulseRepo::find_with_heartbeats(&self.pool, execution_id).await?)
    }

    async fn increment_retries(&self, heartbeat_id: DbId) -> Result<Option<Heartbeat>, StoreError> {
        Ok(HeartbeatRepo::increment_retries(&self.pool, heartbeat_id).await?)
    }

    async fn record_result(
        &self,
        heartbeat_id: DbId,
        result: &HeartbeatResult,
    ) -> Result<Option<Heartbeat>, StoreError> {
        Ok(HeartbeatRepo::record_result(&self.pool, heartbeat_id, result).await?)
    }
}
