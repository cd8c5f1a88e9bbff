use std::sync::Arc;

use autobahn_core::types::DbId;
use autobahn_db::models::connection::KIND_TEAM_CONNECTIONS;
use autobahn_pipeline::ConnectionDirectory;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::state::AppState;
use crate::ws::manager::WsManager;

/// Query parameters for `GET /api/v1/ws`.
#[derive(Debug, Default, Deserialize)]
pub struct WsQuery {
    /// Team whose execution refreshes this connection receives.
    pub team: Option<DbId>,
}

/// HTTP handler that upgrades the connection to WebSocket.
///
/// After the upgrade the connection is registered with `WsManager` and, when
/// a team is given, in that team's connection-directory record.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        handle_socket(socket, query.team, state.ws_manager, state.directory)
    })
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection with `WsManager` and the directory.
///   2. Spawns a sender task that forwards messages from the manager channel.
///   3. Processes inbound messages on the current task.
///   4. Unregisters on disconnect.
async fn handle_socket(
    socket: WebSocket,
    team_id: Option<DbId>,
    ws_manager: Arc<WsManager>,
    directory: Arc<dyn ConnectionDirectory>,
) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, team_id, "WebSocket connected");

    let mut rx = ws_manager.add(conn_id.clone(), team_id).await;
    if let Some(team_id) = team_id {
        if let Err(e) = directory
            .register(&team_id.to_string(), KIND_TEAM_CONNECTIONS, &conn_id)
            .await
        {
            tracing::warn!(
                conn_id = %conn_id,
                team_id,
                error = %e,
                "Failed to register connection"
            );
        }
    }

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward channel messages to the WebSocket sink.
    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
            if closing {
                break;
            }
        }
    });

    // Receiver loop: clients only listen, inbound frames are ignored.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(Message::Text(text)) => {
                tracing::trace!(
                    conn_id = %conn_id,
                    len = text.len(),
                    "Ignoring inbound text frame"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    // Clean up: unregister and abort sender task.
    if let Some(team_id) = team_id {
        if let Err(e) = directory
            .unregister(&team_id.to_string(), KIND_TEAM_CONNECTIONS, &conn_id)
            .await
        {
            tracing::warn!(
                conn_id = %conn_id,
                team_id,
                error = %e,
                "Failed to unregister connection"
            );
        }
    }
    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}
