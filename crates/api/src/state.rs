use std::sync::Arc;

use autobahn_pipeline::{ConnectionDirectory, ExecutionOrchestrator};

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: autobahn_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Live WebSocket connections; also the orchestrator's notification gateway.
    pub ws_manager: Arc<WsManager>,
    pub orchestrator: Arc<ExecutionOrchestrator>,
    /// Written by the WebSocket connection lifecycle, read by broadcasts.
    pub directory: Arc<dyn ConnectionDirectory>,
}
