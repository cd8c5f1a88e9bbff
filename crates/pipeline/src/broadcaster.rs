//! Best-effort fan-out of refresh signals to live connections.
//!
//! A broadcast is a hint ("something changed, re-fetch"), not an event
//! stream. Each push is independent, unordered and never retried; the next
//! state change re-broadcasts anyway.

use std::sync::Arc;

use autobahn_core::signal::RefreshSignal;
use futures::future::join_all;

use crate::gateway::{NotificationGateway, PushError};

/// Per-broadcast delivery tally, for logs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastOutcome {
    pub attempted: usize,
    pub delivered: usize,
    /// Connections the gateway reported as no longer live.
    pub gone: usize,
    pub failed: usize,
}

pub struct FanoutBroadcaster {
    gateway: Arc<dyn NotificationGateway>,
}

impl FanoutBroadcaster {
    pub fn new(gateway: Arc<dyn NotificationGateway>) -> Self {
        Self { gateway }
    }

    /// Push `signal` to every connection concurrently.
    ///
    /// Never fails: a push error is logged against its connection and the
    /// remaining pushes still run to completion.
    pub async fn broadcast(
        &self,
        connections: &[String],
        signal: RefreshSignal,
    ) -> BroadcastOutcome {
        let payload = signal.to_bytes();
        let pushes = connections.iter().map(|connection_id| {
            let payload = &payload;
            async move {
                let result = self.gateway.push(connection_id, payload).await;
                (connection_id, result)
            }
        });

        let mut outcome = BroadcastOutcome {
            attempted: connections.len(),
            ..Default::default()
        };

        for (connection_id, result) in join_all(pushes).await {
            match result {
                Ok(()) => {
                    tracing::debug!(connection_id = %connection_id, "Sent refresh to connection");
                    outcome.delivered += 1;
                }
                Err(PushError::Gone(_)) => {
                    tracing::info!(connection_id = %connection_id, "Skipped stale connection");
                    outcome.gone += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        connection_id = %connection_id,
                        error = %e,
                        "Failed to send refresh to connection",
                    );
                    outcome.failed += 1;
                }
            }
        }

        outcome
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    /// Records every push; fails for ids listed in `gone` or `broken`.
    #[derive(Default)]
    struct ScriptedGateway {
        pushed: Mutex<Vec<(String, Vec<u8>)>>,
        gone: Vec<&'static str>,
        broken: Vec<&'static str>,
    }

    #[async_trait]
    impl NotificationGateway for ScriptedGateway {
        async fn push(&self, connection_id: &str, payload: &[u8]) -> Result<(), PushError> {
            self.pushed
                .lock()
                .unwrap()
                .push((connection_id.to_string(), payload.to_vec()));
            if self.gone.iter().any(|g| *g == connection_id) {
                return Err(PushError::Gone(connection_id.to_string()));
            }
            if self.broken.iter().any(|b| *b == connection_id) {
                return Err(PushError::Transport {
                    connection_id: connection_id.to_string(),
                    reason: "socket reset".into(),
                });
            }
            Ok(())
        }
    }

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn empty_connection_set_is_a_noop() {
        let gateway = Arc::new(ScriptedGateway::default());
        let broadcaster = FanoutBroadcaster::new(gateway.clone());

        let outcome = broadcaster.broadcast(&[], RefreshSignal::ExecutionsTable).await;

        assert_eq!(outcome, BroadcastOutcome::default());
        assert!(gateway.pushed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_others() {
        let gateway = Arc::new(ScriptedGateway {
            broken: vec!["b"],
            ..Default::default()
        });
        let broadcaster = FanoutBroadcaster::new(gateway.clone());

        let outcome = broadcaster
            .broadcast(&ids(&["a", "b", "c", "d"]), RefreshSignal::ExecutionsTable)
            .await;

        assert_eq!(outcome.attempted, 4);
        assert_eq!(outcome.delivered, 3);
        assert_eq!(outcome.failed, 1);

        let mut pushed: Vec<String> = gateway
            .pushed
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect();
        pushed.sort();
        assert_eq!(pushed, ids(&["a", "b", "c", "d"]));
    }

    #[tokio::test]
    async fn stale_connections_are_counted_separately() {
        let gateway = Arc::new(ScriptedGateway {
            gone: vec!["old"],
            ..Default::default()
        });
        let broadcaster = FanoutBroadcaster::new(gateway);

        let outcome = broadcaster
            .broadcast(&ids(&["old", "new"]), RefreshSignal::ExecutionsTable)
            .await;

        assert_eq!(outcome.gone, 1);
        assert_eq!(outcome.delivered, 1);
        assert_eq!(outcome.failed, 0);
    }

    #[tokio::test]
    async fn pushes_the_refresh_payload() {
        let gateway = Arc::new(ScriptedGateway::default());
        let broadcaster = FanoutBroadcaster::new(gateway.clone());

        broadcaster
            .broadcast(&ids(&["a"]), RefreshSignal::ExecutionsTable)
            .await;

        let pushed = gateway.pushed.lock().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&pushed[0].1).unwrap();
        assert_eq!(json["action"], "REFRESH_EXECUTIONS_TABLE");
    }
}
