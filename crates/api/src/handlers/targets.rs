use autobahn_db::models::target::{Target, TargetListQuery};
use autobahn_db::repositories::TargetRepo;
use axum::extract::{Query, State};
use axum::Json;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/targets
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<TargetListQuery>,
) -> AppResult<Json<DataResponse<Vec<Target>>>> {
    let targets = TargetRepo::list(&state.pool, &params).await?;
    Ok(Json(DataResponse { data: targets }))
}
