//! Topic publishing over HTTP with exponential-backoff retry.
//!
//! [`HttpTopicPublisher`] POSTs a JSON-encoded [`DispatchMessage`] to a
//! topic endpoint. Failed attempts are retried up to three times with
//! exponential backoff (1 s, 2 s, 4 s). The endpoint may answer with a JSON
//! body carrying `message_id`; otherwise a local id is assigned.

use std::time::Duration;

use async_trait::async_trait;
use autobahn_core::dispatch::{DispatchMessage, PublishReceipt};
use serde::Deserialize;

use crate::bus::{BusError, DispatchBus};

/// Retry delays in seconds (exponential backoff: 1s, 2s, 4s).
const RETRY_DELAYS_SECS: [u64; 3] = [1, 2, 4];

/// HTTP request timeout for a single publish attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct TopicAck {
    message_id: Option<String>,
}

/// Publishes dispatch messages to an external topic endpoint.
pub struct HttpTopicPublisher {
    client: reqwest::Client,
    topic_url: String,
    retry_delays: Vec<Duration>,
}

impl HttpTopicPublisher {
    /// Create a publisher for `topic_url` with a pre-configured HTTP client.
    pub fn new(topic_url: impl Into<String>) -> Result<Self, BusError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            topic_url: topic_url.into(),
            retry_delays: RETRY_DELAYS_SECS
                .iter()
                .map(|s| Duration::from_secs(*s))
                .collect(),
        })
    }

    /// Override the backoff schedule.
    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = delays;
        self
    }

    pub fn topic_url(&self) -> &str {
        &self.topic_url
    }

    /// Execute a single POST request and check the response status.
    async fn try_send(&self, message: &DispatchMessage) -> Result<PublishReceipt, BusError> {
        let response = self.client.post(&self.topic_url).json(message).send().await?;
        if !response.status().is_success() {
            return Err(BusError::HttpStatus(response.status().as_u16()));
        }
        let message_id = response
            .json::<TopicAck>()
            .await
            .ok()
            .and_then(|ack| ack.message_id)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Ok(PublishReceipt { message_id })
    }
}

#[async_trait]
impl DispatchBus for HttpTopicPublisher {
    async fn publish(&self, message: &DispatchMessage) -> Result<PublishReceipt, BusError> {
        for (attempt, delay) in self.retry_delays.iter().enumerate() {
            match self.try_send(message).await {
                Ok(receipt) => return Ok(receipt),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        topic = %self.topic_url,
                        execution_id = %message.execution_id,
                        viewport = %message.mode,
                        error = %e,
                        "Dispatch publish attempt failed, retrying"
                    );
                    tokio::time::sleep(*delay).await;
                }
            }
        }

        // Final attempt after the last backoff.
        self.try_send(message).await.inspect_err(|e| {
            tracing::error!(
                topic = %self.topic_url,
                execution_id = %message.execution_id,
                error = %e,
                "Dispatch publish failed after all retries"
            );
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use autobahn_core::viewport::Viewport;

    use super::*;

    #[test]
    fn new_does_not_panic() {
        let publisher = HttpTopicPublisher::new("http://localhost:9/topic").unwrap();
        assert_eq!(publisher.topic_url(), "http://localhost:9/topic");
        assert_eq!(publisher.retry_delays.len(), RETRY_DELAYS_SECS.len());
    }

    #[tokio::test]
    async fn unreachable_topic_surfaces_request_error() {
        // Port 9 (discard) on localhost is not listening in test environments.
        let publisher = HttpTopicPublisher::new("http://127.0.0.1:9/topic")
            .unwrap()
            .with_retry_delays(vec![Duration::from_millis(1)]);
        let msg =
            DispatchMessage::new("https://example.com", uuid::Uuid::new_v4(), Viewport::Mobile);

        let result = publisher.publish(&msg).await;
        assert!(matches!(result, Err(BusError::Request(_))));
    }
}
