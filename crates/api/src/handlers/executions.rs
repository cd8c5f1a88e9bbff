//! Handlers for the `/executions` resource.

use autobahn_core::error::CoreError;
use autobahn_core::types::{DbId, ExecutionId};
use autobahn_core::viewport::Viewport;
use autobahn_db::models::heartbeat::{Heartbeat, HeartbeatResult};
use autobahn_db::models::pulse::{Pulse, PulseWithHeartbeats};
use autobahn_pipeline::{CreateExecution, CreatedExecution};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::worker::WorkerAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /api/v1/executions`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateExecutionRequest {
    #[validate(url)]
    pub url: String,
    #[validate(range(min = 1))]
    pub team_id: DbId,
    /// Optional target the execution belongs to.
    pub target: Option<uuid::Uuid>,
}

/// A pulse with its heartbeats keyed by viewport.
#[derive(Debug, Serialize)]
pub struct ExecutionView {
    #[serde(flatten)]
    pub pulse: Pulse,
    pub heartbeats: HeartbeatsByViewport,
}

#[derive(Debug, Serialize)]
pub struct HeartbeatsByViewport {
    pub mobile: Option<Heartbeat>,
    pub desktop: Option<Heartbeat>,
}

impl From<PulseWithHeartbeats> for ExecutionView {
    fn from(value: PulseWithHeartbeats) -> Self {
        let mut heartbeats = HeartbeatsByViewport {
            mobile: None,
            desktop: None,
        };
        for heartbeat in value.heartbeats {
            match heartbeat.viewport() {
                Some(Viewport::Mobile) => heartbeats.mobile = Some(heartbeat),
                Some(Viewport::Desktop) => heartbeats.desktop = Some(heartbeat),
                None => {
                    tracing::warn!(
                        heartbeat_id = heartbeat.id,
                        mode = heartbeat.mode,
                        "Heartbeat with unknown mode"
                    );
                }
            }
        }
        Self {
            pulse: value.pulse,
            heartbeats,
        }
    }
}

/// `{"results": {...}}` body of a retry response.
#[derive(Debug, Serialize)]
pub struct RetryResponse {
    pub results: RetryResults,
}

#[derive(Debug, Serialize)]
pub struct RetryResults {
    /// Bus message id of the republished dispatch, `null` if it failed.
    pub message_id: Option<String>,
    pub execution_id: ExecutionId,
    pub mode: Viewport,
    pub retries: i32,
}

/// POST /api/v1/executions
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateExecutionRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<CreatedExecution>>)> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    let created = state
        .orchestrator
        .create_execution(
            CreateExecution {
                url: input.url,
                team_id: input.team_id,
                target: input.target,
            },
            &user.identity,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// GET /api/v1/executions/{uuid}
pub async fn get_by_id(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(execution_id): Path<String>,
) -> AppResult<Json<DataResponse<ExecutionView>>> {
    let execution = state.orchestrator.get_execution(&execution_id).await?;
    Ok(Json(DataResponse {
        data: execution.into(),
    }))
}

/// POST /api/v1/executions/{uuid}/{viewport}/retry
pub async fn retry(
    State(state): State<AppState>,
    _user: AuthUser,
    Path((execution_id, viewport)): Path<(String, String)>,
) -> AppResult<Json<DataResponse<RetryResponse>>> {
    let outcome = state.orchestrator.retry(&execution_id, &viewport).await?;

    Ok(Json(DataResponse {
        data: RetryResponse {
            results: RetryResults {
                message_id: outcome.receipt.map(|r| r.message_id),
                execution_id: outcome.execution_id,
                mode: outcome.viewport,
                retries: outcome.heartbeat.retries,
            },
        },
    }))
}

/// POST /api/v1/executions/{uuid}/{viewport}/result
pub async fn record_result(
    State(state): State<AppState>,
    _worker: WorkerAuth,
    Path((execution_id, viewport)): Path<(String, String)>,
    Json(result): Json<HeartbeatResult>,
) -> AppResult<Json<DataResponse<Heartbeat>>> {
    let heartbeat = state
        .orchestrator
        .record_result(&execution_id, &viewport, result)
        .await?;
    Ok(Json(DataResponse { data: heartbeat }))
}
