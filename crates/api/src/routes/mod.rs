pub mod executions;
pub mod health;
pub mod targets;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                       WebSocket (?team={team_id})
///
/// /me                                       caller bootstrap payload
///
/// /executions                               create (POST)
/// /executions/{uuid}                        get
/// /executions/{uuid}/{viewport}/retry       retry one viewport (POST)
/// /executions/{uuid}/{viewport}/result      worker completion callback (POST)
///
/// /targets                                  list
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // WebSocket endpoint.
        .route("/ws", get(ws::ws_handler))
        .route("/me", get(handlers::me::get_me))
        .nest("/executions", executions::router())
        .nest("/targets", targets::router())
}
