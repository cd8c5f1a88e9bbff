//! In-memory [`ExecutionStore`] and [`ConnectionDirectory`].
//!
//! Used by tests and by local runs without Postgres. All state sits behind a
//! `std::sync::Mutex` that is never held across an `.await`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use autobahn_core::types::{DbId, ExecutionId};
use autobahn_core::viewport::Viewport;
use autobahn_db::models::heartbeat::{
    Heartbeat, HeartbeatMetrics, HeartbeatResult, HeartbeatScores,
};
use autobahn_db::models::pulse::{CreatePulse, Pulse, PulseWithHeartbeats};
use autobahn_db::models::status::HeartbeatStatus;
use autobahn_db::models::target::Target;
use chrono::Utc;

use crate::directory::{ConnectionDirectory, DirectoryError};
use crate::error::StoreError;
use crate::store::ExecutionStore;

// ---------------------------------------------------------------------------
// Execution store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryExecutionStore {
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    next_id: DbId,
    /// Live URL address → url id.
    urls: HashMap<String, DbId>,
    pulses: Vec<Pulse>,
    heartbeats: Vec<Heartbeat>,
    targets: Vec<Target>,
    /// (subject, team_id) → membership id.
    memberships: HashMap<(String, DbId), DbId>,
    /// When set, every call fails with [`StoreError::Unavailable`].
    unavailable: bool,
}

impl StoreState {
    fn next_id(&mut self) -> DbId {
        self.next_id = self.next_id.saturating_add(1);
        self.next_id
    }

    fn url_id(&mut self, address: &str) -> DbId {
        if let Some(id) = self.urls.get(address) {
            return *id;
        }
        let id = self.next_id();
        self.urls.insert(address.to_string(), id);
        id
    }

    fn heartbeats_of(&self, pulse_id: DbId) -> Vec<Heartbeat> {
        let mut heartbeats: Vec<Heartbeat> = self
            .heartbeats
            .iter()
            .filter(|h| h.pulse_id == pulse_id)
            .cloned()
            .collect();
        heartbeats.sort_by_key(|h| h.mode);
        heartbeats
    }
}

impl InMemoryExecutionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, StoreError> {
        let state = self
            .state
            .lock()
            .map_err(|_| StoreError::Unavailable("execution store mutex poisoned".into()))?;
        if state.unavailable {
            return Err(StoreError::Unavailable("execution store offline".into()));
        }
        Ok(state)
    }

    /// Toggle simulated outage.
    pub fn set_unavailable(&self, unavailable: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.unavailable = unavailable;
        }
    }

    /// Seed a target for `url` and return it.
    pub fn insert_target(&self, name: &str, url: &str, provider: i16, stage: i16) -> Target {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let url_id = state.url_id(url);
        let now = Utc::now();
        let target = Target {
            id: state.next_id(),
            uuid: uuid::Uuid::new_v4(),
            name: name.to_string(),
            url_id,
            url: url.to_string(),
            provider,
            stage,
            worker_function: None,
            created_at: now,
            updated_at: now,
        };
        state.targets.push(target.clone());
        target
    }

    /// Seed a membership of `subject` in `team_id` and return its id.
    pub fn insert_membership(&self, subject: &str, team_id: DbId) -> DbId {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let id = state.next_id();
        state.memberships.insert((subject.to_string(), team_id), id);
        id
    }

    pub fn pulse_count(&self) -> usize {
        self.state
            .lock()
            .map(|s| s.pulses.len())
            .unwrap_or_default()
    }

    /// Snapshot of every stored heartbeat, across all pulses.
    pub fn all_heartbeats(&self) -> Vec<Heartbeat> {
        self.state
            .lock()
            .map(|s| s.heartbeats.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ExecutionStore for InMemoryExecutionStore {
    async fn find_target(&self, uuid: uuid::Uuid) -> Result<Option<Target>, StoreError> {
        let state = self.lock()?;
        Ok(state.targets.iter().find(|t| t.uuid == uuid).cloned())
    }

    async fn find_membership(
        &self,
        subject: &str,
        team_id: DbId,
    ) -> Result<Option<DbId>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .memberships
            .get(&(subject.to_string(), team_id))
            .copied())
    }

    async fn create_execution(
        &self,
        input: &CreatePulse,
    ) -> Result<PulseWithHeartbeats, StoreError> {
        let mut state = self.lock()?;
        let now = Utc::now();

        let url_id = state.url_id(&input.url);
        let pulse = Pulse {
            id: state.next_id(),
            execution_id: input.execution_id,
            url_id,
            url: input.url.clone(),
            team_id: input.team_id,
            target_id: input.target_id,
            schedule_id: None,
            membership_id: input.membership_id,
            triggered_by: input.triggered_by.clone(),
            provider: input.provider,
            stage: input.stage,
            created_at: now,
            updated_at: now,
        };

        let mut heartbeats = Vec::with_capacity(Viewport::ALL.len());
        for viewport in Viewport::ALL {
            heartbeats.push(Heartbeat {
                id: state.next_id(),
                pulse_id: pulse.id,
                mode: viewport.code(),
                retries: 0,
                status: HeartbeatStatus::Pending.id(),
                metrics: HeartbeatMetrics::default(),
                scores: HeartbeatScores::default(),
                screenshots: None,
                created_at: now,
                updated_at: now,
                ended_at: None,
            });
        }

        state.pulses.push(pulse.clone());
        state.heartbeats.extend(heartbeats.iter().cloned());

        Ok(PulseWithHeartbeats { pulse, heartbeats })
    }

    async fn find_pulse(&self, execution_id: ExecutionId) -> Result<Option<Pulse>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .pulses
            .iter()
            .find(|p| p.execution_id == execution_id)
            .cloned())
    }

    async fn find_heartbeat(
        &self,
        pulse_id: DbId,
        viewport: Viewport,
    ) -> Result<Option<Heartbeat>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .heartbeats
            .iter()
            .find(|h| h.pulse_id == pulse_id && h.mode == viewport.code())
            .cloned())
    }

    async fn find_execution(
        &self,
        execution_id: ExecutionId,
    ) -> Result<Option<PulseWithHeartbeats>, StoreError> {
        let state = self.lock()?;
        let Some(pulse) = state
            .pulses
            .iter()
            .find(|p| p.execution_id == execution_id)
            .cloned()
        else {
            return Ok(None);
        };
        let heartbeats = state.heartbeats_of(pulse.id);
        Ok(Some(PulseWithHeartbeats { pulse, heartbeats }))
    }

    async fn increment_retries(&self, heartbeat_id: DbId) -> Result<Option<Heartbeat>, StoreError> {
        let mut state = self.lock()?;
        let Some(heartbeat) = state.heartbeats.iter_mut().find(|h| h.id == heartbeat_id) else {
            return Ok(None);
        };
        heartbeat.retries += 1;
        heartbeat.updated_at = Utc::now();
        Ok(Some(heartbeat.clone()))
    }

    async fn record_result(
        &self,
        heartbeat_id: DbId,
        result: &HeartbeatResult,
    ) -> Result<Option<Heartbeat>, StoreError> {
        let mut state = self.lock()?;
        let Some(heartbeat) = state.heartbeats.iter_mut().find(|h| h.id == heartbeat_id) else {
            return Ok(None);
        };
        let now = Utc::now();
        heartbeat.status = result.status.id();
        heartbeat.metrics = result.metrics;
        heartbeat.scores = result.scores;
        heartbeat.screenshots = result.screenshots.clone();
        heartbeat.updated_at = now;
        if result.status.is_terminal() {
            heartbeat.ended_at = Some(now);
        }
        Ok(Some(heartbeat.clone()))
    }
}

// ---------------------------------------------------------------------------
// Connection directory
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryConnectionDirectory {
    records: Mutex<HashMap<(String, String), Vec<String>>>,
    unavailable: Mutex<bool>,
}

impl InMemoryConnectionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle simulated outage.
    pub fn set_unavailable(&self, unavailable: bool) {
        if let Ok(mut flag) = self.unavailable.lock() {
            *flag = unavailable;
        }
    }

    fn records(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<(String, String), Vec<String>>>, DirectoryError> {
        let offline = self.unavailable.lock().map(|f| *f).unwrap_or(true);
        if offline {
            return Err(DirectoryError::Unavailable("connection directory offline".into()));
        }
        self.records
            .lock()
            .map_err(|_| DirectoryError::Unavailable("connection directory mutex poisoned".into()))
    }
}

#[async_trait]
impl ConnectionDirectory for InMemoryConnectionDirectory {
    async fn connections(&self, sub: &str, kind: &str) -> Result<Vec<String>, DirectoryError> {
        let records = self.records()?;
        Ok(records
            .get(&(sub.to_string(), kind.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn register(
        &self,
        sub: &str,
        kind: &str,
        connection_id: &str,
    ) -> Result<(), DirectoryError> {
        let mut records = self.records()?;
        let set = records
            .entry((sub.to_string(), kind.to_string()))
            .or_default();
        if !set.iter().any(|c| c == connection_id) {
            set.push(connection_id.to_string());
        }
        Ok(())
    }

    async fn unregister(
        &self,
        sub: &str,
        kind: &str,
        connection_id: &str,
    ) -> Result<(), DirectoryError> {
        let mut records = self.records()?;
        if let Some(set) = records.get_mut(&(sub.to_string(), kind.to_string())) {
            set.retain(|c| c != connection_id);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use autobahn_db::models::connection::KIND_TEAM_CONNECTIONS;
    use autobahn_db::models::status::defaults;

    use super::*;

    fn create_input(url: &str) -> CreatePulse {
        CreatePulse {
            execution_id: uuid::Uuid::new_v4(),
            url: url.to_string(),
            team_id: 7,
            target_id: None,
            membership_id: None,
            triggered_by: Some("ada".into()),
            provider: defaults::PROVIDER,
            stage: defaults::STAGE,
        }
    }

    #[tokio::test]
    async fn create_writes_one_pending_heartbeat_per_viewport() {
        let store = InMemoryExecutionStore::new();
        let created = store
            .create_execution(&create_input("https://example.com"))
            .await
            .unwrap();

        let modes: Vec<_> = created.heartbeats.iter().map(|h| h.mode).collect();
        assert_eq!(modes, vec![0, 1]);
        assert!(created.heartbeats.iter().all(|h| h.retries == 0));
        assert!(created
            .heartbeats
            .iter()
            .all(|h| h.status == HeartbeatStatus::Pending.id()));
    }

    #[tokio::test]
    async fn same_address_reuses_url_row() {
        let store = InMemoryExecutionStore::new();
        let a = store
            .create_execution(&create_input("https://example.com"))
            .await
            .unwrap();
        let b = store
            .create_execution(&create_input("https://example.com"))
            .await
            .unwrap();
        assert_eq!(a.pulse.url_id, b.pulse.url_id);
        assert_ne!(a.pulse.id, b.pulse.id);
    }

    #[tokio::test]
    async fn increment_is_per_heartbeat() {
        let store = InMemoryExecutionStore::new();
        let created = store
            .create_execution(&create_input("https://example.com"))
            .await
            .unwrap();
        let desktop = &created.heartbeats[1];

        store.increment_retries(desktop.id).await.unwrap();
        let bumped = store.increment_retries(desktop.id).await.unwrap().unwrap();
        assert_eq!(bumped.retries, 2);

        let mobile = store
            .find_heartbeat(created.pulse.id, Viewport::Mobile)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(mobile.retries, 0);
    }

    #[tokio::test]
    async fn terminal_result_sets_ended_at() {
        let store = InMemoryExecutionStore::new();
        let created = store
            .create_execution(&create_input("https://example.com"))
            .await
            .unwrap();
        let result = HeartbeatResult {
            status: HeartbeatStatus::Completed,
            metrics: HeartbeatMetrics::default(),
            scores: HeartbeatScores {
                performance_score: 91,
                ..Default::default()
            },
            screenshots: None,
        };

        let updated = store
            .record_result(created.heartbeats[0].id, &result)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status(), Some(HeartbeatStatus::Completed));
        assert_eq!(updated.scores.performance_score, 91);
        assert_eq!(updated.retries, 0);
        assert!(updated.ended_at.is_some());
    }

    #[tokio::test]
    async fn unavailable_store_rejects_calls() {
        let store = InMemoryExecutionStore::new();
        store.set_unavailable(true);
        assert_matches!(
            store.create_execution(&create_input("https://example.com")).await,
            Err(StoreError::Unavailable(_))
        );
        assert_eq!(store.pulse_count(), 0);
    }

    #[tokio::test]
    async fn directory_register_is_a_set() {
        let directory = InMemoryConnectionDirectory::new();
        directory.register("42", KIND_TEAM_CONNECTIONS, "c1").await.unwrap();
        directory.register("42", KIND_TEAM_CONNECTIONS, "c1").await.unwrap();
        directory.register("42", KIND_TEAM_CONNECTIONS, "c2").await.unwrap();

        assert_eq!(
            directory.team_connections(42).await.unwrap(),
            vec!["c1".to_string(), "c2".to_string()]
        );

        directory.unregister("42", KIND_TEAM_CONNECTIONS, "c1").await.unwrap();
        assert_eq!(directory.team_connections(42).await.unwrap(), vec!["c2".to_string()]);
        assert!(directory.team_connections(7).await.unwrap().is_empty());
    }
}
