//! Push channel to individual live connections.

use async_trait::async_trait;

/// Failure pushing to one connection.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The connection is no longer live. Its directory entry is stale.
    #[error("Connection {0} is gone")]
    Gone(String),

    #[error("Push to {connection_id} failed: {reason}")]
    Transport {
        connection_id: String,
        reason: String,
    },
}

/// Sends a payload to a specific live connection.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn push(&self, connection_id: &str, payload: &[u8]) -> Result<(), PushError>;
}
