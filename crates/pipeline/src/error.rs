use autobahn_core::types::ExecutionId;
use autobahn_core::viewport::Viewport;

/// Failure of the system-of-record store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Typed failures surfaced by [`ExecutionOrchestrator`](crate::ExecutionOrchestrator)
/// operations. Each one aborts its operation before any notification.
#[derive(Debug, thiserror::Error)]
pub enum OrchestrationError {
    /// The viewport token was not `mobile` or `desktop`.
    #[error("Invalid viewport: {0:?}")]
    InvalidViewport(String),

    /// A worker reported a result that violates heartbeat constraints.
    #[error("Invalid result: {0}")]
    InvalidResult(String),

    /// No live pulse carries this execution id.
    #[error("Execution {0} not found")]
    ExecutionNotFound(String),

    /// The pulse exists but lacks the heartbeat for a viewport. Every pulse
    /// is created with both, so this means the stored model is corrupt.
    #[error("Execution {execution_id} has no {viewport} heartbeat")]
    HeartbeatMissing {
        execution_id: ExecutionId,
        viewport: Viewport,
    },

    #[error("Target {0} not found")]
    TargetNotFound(uuid::Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<sqlx::Error> for OrchestrationError {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(StoreError::Database(err))
    }
}
