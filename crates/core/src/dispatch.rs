//! Audit-work messages carried by the dispatch bus.

use serde::{Deserialize, Serialize};

use crate::types::ExecutionId;
use crate::viewport::Viewport;

/// One unit of audit work for a worker: measure `url` in `mode` and report
/// back against `execution_id`.
///
/// Serialized as `{"url", "uuid", "mode"}`. The execution id travels under
/// the `uuid` key that workers read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchMessage {
    pub url: String,
    #[serde(rename = "uuid")]
    pub execution_id: ExecutionId,
    pub mode: Viewport,
}

impl DispatchMessage {
    pub fn new(url: impl Into<String>, execution_id: ExecutionId, mode: Viewport) -> Self {
        Self {
            url: url.into(),
            execution_id,
            mode,
        }
    }
}

/// Acknowledgment returned by the bus for an accepted publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    /// Bus-assigned message id.
    pub message_id: String,
}
