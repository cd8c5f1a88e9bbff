//! Connection directory: subscriber group → live connection ids.
//!
//! The orchestrator only reads it. The WebSocket connection lifecycle owns
//! [`register`](ConnectionDirectory::register) and
//! [`unregister`](ConnectionDirectory::unregister).

use async_trait::async_trait;
use autobahn_core::types::DbId;
use autobahn_db::models::connection::KIND_TEAM_CONNECTIONS;
use autobahn_db::repositories::ConnectionRepo;
use autobahn_db::DbPool;

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Directory database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Directory unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ConnectionDirectory: Send + Sync {
    /// Live connection ids for `(sub, kind)`. A missing record is an empty set.
    async fn connections(&self, sub: &str, kind: &str) -> Result<Vec<String>, DirectoryError>;

    async fn register(&self, sub: &str, kind: &str, connection_id: &str)
        -> Result<(), DirectoryError>;

    async fn unregister(
        &self,
        sub: &str,
        kind: &str,
        connection_id: &str,
    ) -> Result<(), DirectoryError>;

    /// Live connections subscribed to a team.
    async fn team_connections(&self, team_id: DbId) -> Result<Vec<String>, DirectoryError> {
        self.connections(&team_id.to_string(), KIND_TEAM_CONNECTIONS)
            .await
    }
}

/// Directory backed by the `connection_directory` table.
#[derive(Clone)]
pub struct PgConnectionDirectory {
    pool: DbPool,
}

impl PgConnectionDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConnectionDirectory for PgConnectionDirectory {
    async fn connections(&self, sub: &str, kind: &str) -> Result<Vec<String>, DirectoryError> {
        let record = ConnectionRepo::find(&self.pool, sub, kind).await?;
        Ok(record.map(|r| r.connections).unwrap_or_default())
    }

    async fn register(
        &self,
        sub: &str,
        kind: &str,
        connection_id: &str,
    ) -> Result<(), DirectoryError> {
        ConnectionRepo::add(&self.pool, sub, kind, connection_id).await?;
        Ok(())
    }

    async fn unregister(
        &self,
        sub: &str,
        kind: &str,
        connection_id: &str,
    ) -> Result<(), DirectoryError> {
        ConnectionRepo::remove(&self.pool, sub, kind, connection_id).await?;
        Ok(())
    }
}
