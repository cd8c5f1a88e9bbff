use axum::routing::get;
use axum::Router;

use crate::handlers::targets;
use crate::state::AppState;

/// Target routes mounted at `/targets`.
///
/// ```text
/// GET    /                  -> list
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(targets::list))
}
