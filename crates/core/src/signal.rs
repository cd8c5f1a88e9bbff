//! Liveness hints pushed to connected clients.

use serde::Serialize;

/// Signal telling a client that execution state changed and it should
/// re-fetch. Delivery is best effort; clients recover by polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action")]
pub enum RefreshSignal {
    #[serde(rename = "REFRESH_EXECUTIONS_TABLE")]
    ExecutionsTable,
}

impl RefreshSignal {
    /// Encode the signal as the bytes pushed on the wire.
    pub fn to_bytes(self) -> Vec<u8> {
        // A unit variant with an internal tag cannot fail to serialize.
        serde_json::to_vec(&self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_encodes_action_tag() {
        let bytes = RefreshSignal::ExecutionsTable.to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json, serde_json::json!({"action": "REFRESH_EXECUTIONS_TABLE"}));
    }
}
