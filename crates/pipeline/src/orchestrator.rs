//! Execution orchestrator: create, retry and complete audit executions.
//!
//! Every operation commits to the [`ExecutionStore`] first and only then
//! notifies. Commit failures surface to the caller; notify failures
//! (dispatch publish, directory lookup, connection push) are logged and
//! swallowed.

use std::sync::Arc;

use autobahn_core::dispatch::{DispatchMessage, PublishReceipt};
use autobahn_core::identity::CallerIdentity;
use autobahn_core::signal::RefreshSignal;
use autobahn_core::types::{DbId, ExecutionId};
use autobahn_core::viewport::Viewport;
use autobahn_db::models::heartbeat::{Heartbeat, HeartbeatResult};
use autobahn_db::models::pulse::{CreatePulse, Pulse, PulseWithHeartbeats};
use autobahn_db::models::status::defaults;
use autobahn_events::DispatchBus;
use futures::future::join_all;
use serde::Serialize;

use crate::broadcaster::FanoutBroadcaster;
use crate::directory::ConnectionDirectory;
use crate::error::OrchestrationError;
use crate::gateway::NotificationGateway;
use crate::store::ExecutionStore;

/// Input for [`ExecutionOrchestrator::create_execution`].
#[derive(Debug, Clone)]
pub struct CreateExecution {
    pub url: String,
    /// Owning team; its live connections are told to refresh.
    pub team_id: DbId,
    /// Optional target whose provider and stage the pulse inherits.
    pub target: Option<uuid::Uuid>,
}

/// The two heartbeats written for a new execution, keyed by viewport.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedExecution {
    pub execution_id: ExecutionId,
    pub mobile: Heartbeat,
    pub desktop: Heartbeat,
}

#[derive(Debug, Clone)]
pub struct RetryOutcome {
    pub execution_id: ExecutionId,
    pub viewport: Viewport,
    /// The heartbeat after its retry counter was bumped.
    pub heartbeat: Heartbeat,
    /// Bus acknowledgment, or `None` if the republish failed (already logged).
    pub receipt: Option<PublishReceipt>,
}

pub struct ExecutionOrchestrator {
    store: Arc<dyn ExecutionStore>,
    bus: Arc<dyn DispatchBus>,
    directory: Arc<dyn ConnectionDirectory>,
    broadcaster: FanoutBroadcaster,
}

impl ExecutionOrchestrator {
    pub fn new(
        store: Arc<dyn ExecutionStore>,
        bus: Arc<dyn DispatchBus>,
        directory: Arc<dyn ConnectionDirectory>,
        gateway: Arc<dyn NotificationGateway>,
    ) -> Self {
        Self {
            store,
            bus,
            directory,
            broadcaster: FanoutBroadcaster::new(gateway),
        }
    }

    /// Create a pulse with one pending heartbeat per viewport, dispatch both
    /// and tell the owning team to refresh.
    ///
    /// Never deduplicated: two identical requests produce two executions.
    pub async fn create_execution(
        &self,
        input: CreateExecution,
        caller: &CallerIdentity,
    ) -> Result<CreatedExecution, OrchestrationError> {
        let (target_id, provider, stage) = match input.target {
            Some(target_uuid) => {
                let target = self
                    .store
                    .find_target(target_uuid)
                    .await?
                    .ok_or(OrchestrationError::TargetNotFound(target_uuid))?;
                (Some(target.id), target.provider, target.stage)
            }
            None => (None, defaults::PROVIDER, defaults::STAGE),
        };

        let membership_id = self
            .store
            .find_membership(&caller.subject, input.team_id)
            .await?;

        let execution_id = uuid::Uuid::new_v4();
        let created = self
            .store
            .create_execution(&CreatePulse {
                execution_id,
                url: input.url,
                team_id: input.team_id,
                target_id,
                membership_id,
                triggered_by: Some(caller.username.clone()),
                provider,
                stage,
            })
            .await?;

        tracing::info!(
            execution_id = %execution_id,
            team_id = created.pulse.team_id,
            url = %created.pulse.url,
            triggered_by = %caller.username,
            "Execution created",
        );

        let (mobile, desktop) = split_by_viewport(&created)?;

        let publishes = Viewport::ALL.map(|viewport| {
            self.publish(DispatchMessage::new(
                created.pulse.url.as_str(),
                execution_id,
                viewport,
            ))
        });
        futures::join!(
            join_all(publishes),
            self.broadcast_team(created.pulse.team_id)
        );

        Ok(CreatedExecution {
            execution_id,
            mobile,
            desktop,
        })
    }

    /// Bump the retry counter of one heartbeat and republish its dispatch
    /// message.
    ///
    /// Not idempotent: each call adds one and dispatches once.
    pub async fn retry(
        &self,
        execution_id: &str,
        viewport_token: &str,
    ) -> Result<RetryOutcome, OrchestrationError> {
        let viewport = parse_viewport(viewport_token)?;
        let execution_id = parse_execution_id(execution_id)?;
        let (pulse, heartbeat) = self.resolve_heartbeat(execution_id, viewport).await?;

        let heartbeat = self
            .store
            .increment_retries(heartbeat.id)
            .await?
            .ok_or(OrchestrationError::HeartbeatMissing {
                execution_id,
                viewport,
            })?;

        tracing::info!(
            execution_id = %execution_id,
            viewport = %viewport,
            heartbeat_id = heartbeat.id,
            retries = heartbeat.retries,
            "Heartbeat retry requested",
        );

        let (receipt, _) = futures::join!(
            self.publish(DispatchMessage::new(pulse.url, execution_id, viewport)),
            self.broadcast_team(pulse.team_id)
        );

        Ok(RetryOutcome {
            execution_id,
            viewport,
            heartbeat,
            receipt,
        })
    }

    /// Record a worker's result for one heartbeat and tell the owning team
    /// to refresh. Never touches the retry counter.
    pub async fn record_result(
        &self,
        execution_id: &str,
        viewport_token: &str,
        result: HeartbeatResult,
    ) -> Result<Heartbeat, OrchestrationError> {
        let viewport = parse_viewport(viewport_token)?;
        validate_result(&result)?;
        let execution_id = parse_execution_id(execution_id)?;

        let (pulse, heartbeat) = self.resolve_heartbeat(execution_id, viewport).await?;

        let heartbeat = self
            .store
            .record_result(heartbeat.id, &result)
            .await?
            .ok_or(OrchestrationError::HeartbeatMissing {
                execution_id,
                viewport,
            })?;

        tracing::info!(
            execution_id = %execution_id,
            viewport = %viewport,
            heartbeat_id = heartbeat.id,
            status = ?result.status,
            "Heartbeat result recorded",
        );

        self.broadcast_team(pulse.team_id).await;
        Ok(heartbeat)
    }

    /// Read back a pulse with its heartbeats.
    pub async fn get_execution(
        &self,
        execution_id: &str,
    ) -> Result<PulseWithHeartbeats, OrchestrationError> {
        let execution_id = parse_execution_id(execution_id)?;
        self.store
            .find_execution(execution_id)
            .await?
            .ok_or_else(|| OrchestrationError::ExecutionNotFound(execution_id.to_string()))
    }

    /// Look up the pulse and its heartbeat for `viewport`.
    async fn resolve_heartbeat(
        &self,
        execution_id: ExecutionId,
        viewport: Viewport,
    ) -> Result<(Pulse, Heartbeat), OrchestrationError> {
        let Some(pulse) = self.store.find_pulse(execution_id).await? else {
            tracing::debug!(execution_id = %execution_id, "Unknown execution");
            return Err(OrchestrationError::ExecutionNotFound(
                execution_id.to_string(),
            ));
        };

        match self.store.find_heartbeat(pulse.id, viewport).await? {
            Some(heartbeat) => Ok((pulse, heartbeat)),
            None => {
                tracing::error!(
                    execution_id = %execution_id,
                    pulse_id = pulse.id,
                    viewport = %viewport,
                    "Pulse is missing a viewport heartbeat",
                );
                Err(OrchestrationError::HeartbeatMissing {
                    execution_id,
                    viewport,
                })
            }
        }
    }

    /// Publish one dispatch message, logging instead of failing.
    async fn publish(&self, message: DispatchMessage) -> Option<PublishReceipt> {
        match self.bus.publish(&message).await {
            Ok(receipt) => {
                tracing::debug!(
                    execution_id = %message.execution_id,
                    viewport = %message.mode,
                    message_id = %receipt.message_id,
                    "Dispatch message published",
                );
                Some(receipt)
            }
            Err(e) => {
                tracing::warn!(
                    execution_id = %message.execution_id,
                    viewport = %message.mode,
                    error = %e,
                    "Failed to publish dispatch message",
                );
                None
            }
        }
    }

    /// Tell every live connection of `team_id` to refresh.
    async fn broadcast_team(&self, team_id: DbId) {
        let connections = match self.directory.team_connections(team_id).await {
            Ok(connections) => connections,
            Err(e) => {
                tracing::warn!(team_id, error = %e, "Failed to read team connections");
                Vec::new()
            }
        };

        let outcome = self
            .broadcaster
            .broadcast(&connections, RefreshSignal::ExecutionsTable)
            .await;
        tracing::debug!(
            team_id,
            attempted = outcome.attempted,
            delivered = outcome.delivered,
            gone = outcome.gone,
            failed = outcome.failed,
            "Refresh broadcast finished",
        );
    }
}

fn parse_viewport(token: &str) -> Result<Viewport, OrchestrationError> {
    Viewport::from_token(token).map_err(|_| OrchestrationError::InvalidViewport(token.to_string()))
}

/// An unparsable id cannot name a stored execution.
fn parse_execution_id(raw: &str) -> Result<ExecutionId, OrchestrationError> {
    uuid::Uuid::parse_str(raw).map_err(|_| OrchestrationError::ExecutionNotFound(raw.to_string()))
}

fn validate_result(result: &HeartbeatResult) -> Result<(), OrchestrationError> {
    if !result.status.is_terminal() {
        return Err(OrchestrationError::InvalidResult(format!(
            "status must be terminal, got {:?}",
            result.status
        )));
    }
    if !result.scores.in_range() {
        return Err(OrchestrationError::InvalidResult(
            "scores must be within 0..=100".into(),
        ));
    }
    let m = &result.metrics;
    if [m.ttfb, m.fcp, m.dcl, m.lcp, m.tti, m.si, m.cls]
        .iter()
        .any(|v| !v.is_finite() || *v < 0.0)
    {
        return Err(OrchestrationError::InvalidResult(
            "metrics must be finite and non-negative".into(),
        ));
    }
    Ok(())
}

fn split_by_viewport(
    created: &PulseWithHeartbeats,
) -> Result<(Heartbeat, Heartbeat), OrchestrationError> {
    let find = |viewport: Viewport| {
        created
            .heartbeats
            .iter()
            .find(|h| h.mode == viewport.code())
            .cloned()
            .ok_or(OrchestrationError::HeartbeatMissing {
                execution_id: created.pulse.execution_id,
                viewport,
            })
    };
    Ok((find(Viewport::Mobile)?, find(Viewport::Desktop)?))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use autobahn_db::models::heartbeat::{HeartbeatMetrics, HeartbeatScores};
    use autobahn_db::models::status::HeartbeatStatus;

    use super::*;

    fn result(scores: HeartbeatScores, metrics: HeartbeatMetrics) -> HeartbeatResult {
        HeartbeatResult {
            status: HeartbeatStatus::Completed,
            metrics,
            scores,
            screenshots: None,
        }
    }

    #[test]
    fn viewport_tokens_are_exact() {
        assert_eq!(parse_viewport("mobile").unwrap(), Viewport::Mobile);
        assert_matches!(parse_viewport("Mobile"), Err(OrchestrationError::InvalidViewport(_)));
        assert_matches!(parse_viewport(""), Err(OrchestrationError::InvalidViewport(_)));
    }

    #[test]
    fn malformed_execution_id_is_not_found() {
        assert_matches!(
            parse_execution_id("not-a-uuid"),
            Err(OrchestrationError::ExecutionNotFound(id)) if id == "not-a-uuid"
        );
    }

    #[test]
    fn out_of_range_scores_are_rejected() {
        let bad = result(
            HeartbeatScores {
                seo_score: 101,
                ..Default::default()
            },
            HeartbeatMetrics::default(),
        );
        assert_matches!(validate_result(&bad), Err(OrchestrationError::InvalidResult(_)));
    }

    #[test]
    fn negative_or_nan_metrics_are_rejected() {
        let negative = result(
            HeartbeatScores::default(),
            HeartbeatMetrics {
                lcp: -1.0,
                ..Default::default()
            },
        );
        let nan = result(
            HeartbeatScores::default(),
            HeartbeatMetrics {
                cls: f64::NAN,
                ..Default::default()
            },
        );
        assert_matches!(validate_result(&negative), Err(OrchestrationError::InvalidResult(_)));
        assert_matches!(validate_result(&nan), Err(OrchestrationError::InvalidResult(_)));
        assert!(validate_result(&result(Default::default(), Default::default())).is_ok());
    }

    #[test]
    fn only_terminal_statuses_are_accepted() {
        for status in HeartbeatStatus::ALL {
            let outcome = validate_result(&HeartbeatResult {
                status: *status,
                ..result(Default::default(), Default::default())
            });
            if status.is_terminal() {
                assert!(outcome.is_ok(), "{status:?} should be accepted");
            } else {
                assert_matches!(outcome, Err(OrchestrationError::InvalidResult(_)));
            }
        }
    }
}
