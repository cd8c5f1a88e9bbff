use std::collections::HashMap;

use async_trait::async_trait;
use autobahn_core::types::{DbId, Timestamp};
use autobahn_pipeline::{NotificationGateway, PushError};
use axum::body::Bytes;
use axum::extract::ws::Message;
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Metadata for a single WebSocket connection.
pub struct WsConnection {
    /// Team whose refresh signals this connection subscribed to.
    pub team_id: Option<DbId>,
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    pub connected_at: Timestamp,
}

/// Manages all active WebSocket connections.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application. Also serves as the pipeline's
/// [`NotificationGateway`].
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl WsManager {
    /// Create a new, empty connection manager.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn add(
        &self,
        conn_id: String,
        team_id: Option<DbId>,
    ) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            team_id,
            sender: tx,
            connected_at: chrono::Utc::now(),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Remove a connection by its ID.
    pub async fn remove(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);
    }

    /// Send a message to one connection.
    ///
    /// Fails with [`PushError::Gone`] if the connection is unknown or its
    /// channel is closed.
    pub async fn send(&self, conn_id: &str, message: Message) -> Result<(), PushError> {
        let conns = self.connections.read().await;
        let conn = conns
            .get(conn_id)
            .ok_or_else(|| PushError::Gone(conn_id.to_string()))?;
        conn.sender
            .send(message)
            .map_err(|_| PushError::Gone(conn_id.to_string()))
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    ///
    /// Used during graceful shutdown to notify all clients before the
    /// server stops.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Send a Ping frame to every connected client.
    ///
    /// Used by the heartbeat task to keep connections alive and detect
    /// stale ones.
    pub async fn ping_all(&self) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationGateway for WsManager {
    async fn push(&self, connection_id: &str, payload: &[u8]) -> Result<(), PushError> {
        let text = String::from_utf8(payload.to_vec()).map_err(|e| PushError::Transport {
            connection_id: connection_id.to_string(),
            reason: e.to_string(),
        })?;
        self.send(connection_id, Message::Text(text.into())).await
    }
}
