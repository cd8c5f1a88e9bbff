use axum::routing::{get, post};
use axum::Router;

use crate::handlers::executions;
use crate::state::AppState;

/// Execution routes mounted at `/executions`.
///
/// ```text
/// POST   /                              -> create
/// GET    /{uuid}                        -> get_by_id
/// POST   /{uuid}/{viewport}/retry       -> retry
/// POST   /{uuid}/{viewport}/result      -> record_result (worker token)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(executions::create))
        .route("/{uuid}", get(executions::get_by_id))
        .route("/{uuid}/{viewport}/retry", post(executions::retry))
        .route("/{uuid}/{viewport}/result", post(executions::record_result))
}
