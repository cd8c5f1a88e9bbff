//! Shared-secret extractor for worker callbacks.

use autobahn_core::error::CoreError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the worker shared secret.
pub const WORKER_TOKEN_HEADER: &str = "x-worker-token";

/// A worker that presented the configured `x-worker-token`.
///
/// Rejects every request with 403 when no `WORKER_TOKEN` is configured.
#[derive(Debug, Clone, Copy)]
pub struct WorkerAuth;

impl FromRequestParts<AppState> for WorkerAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.worker_token.as_deref() else {
            return Err(AppError::Core(CoreError::Forbidden(
                "Worker callbacks are disabled".into(),
            )));
        };

        let presented = parts
            .headers
            .get(WORKER_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized("Missing worker token".into()))
            })?;

        if presented != expected {
            return Err(AppError::Core(CoreError::Unauthorized(
                "Invalid worker token".into(),
            )));
        }

        Ok(WorkerAuth)
    }
}
