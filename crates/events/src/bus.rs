//! Dispatch bus abstraction and its in-process implementation.
//!
//! [`InProcessDispatchBus`] wraps a `tokio::sync::broadcast` channel so any
//! number of worker loops can independently receive every published
//! [`DispatchMessage`]. It is designed to be shared via `Arc`.

use async_trait::async_trait;
use autobahn_core::dispatch::{DispatchMessage, PublishReceipt};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for dispatch publication failures.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// Nobody is listening, so the message would be lost.
    #[error("No subscribers on the dispatch bus")]
    NoSubscribers,

    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("Topic request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The topic endpoint returned a non-2xx status code.
    #[error("Topic returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// DispatchBus
// ---------------------------------------------------------------------------

/// At-least-once channel carrying audit work to workers.
#[async_trait]
pub trait DispatchBus: Send + Sync {
    /// Publish one message and return the bus acknowledgment.
    async fn publish(&self, message: &DispatchMessage) -> Result<PublishReceipt, BusError>;
}

// ---------------------------------------------------------------------------
// InProcessDispatchBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out dispatch bus.
///
/// # Usage
///
/// ```rust
/// use autobahn_core::dispatch::DispatchMessage;
/// use autobahn_core::viewport::Viewport;
/// use autobahn_events::InProcessDispatchBus;
///
/// let bus = InProcessDispatchBus::default();
/// let mut rx = bus.subscribe();
/// bus.send(DispatchMessage::new("https://example.com", uuid::Uuid::new_v4(), Viewport::Mobile))
///     .unwrap();
/// assert!(rx.try_recv().is_ok());
/// ```
pub struct InProcessDispatchBus {
    sender: broadcast::Sender<(String, DispatchMessage)>,
}

impl InProcessDispatchBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish synchronously, returning the assigned message id.
    pub fn send(&self, message: DispatchMessage) -> Result<PublishReceipt, BusError> {
        let message_id = uuid::Uuid::new_v4().to_string();
        self.sender
            .send((message_id.clone(), message))
            .map_err(|_| BusError::NoSubscribers)?;
        Ok(PublishReceipt { message_id })
    }

    /// Subscribe to every message published from now on. Each item carries
    /// the message id assigned at publish time.
    pub fn subscribe(&self) -> broadcast::Receiver<(String, DispatchMessage)> {
        self.sender.subscribe()
    }
}

impl Default for InProcessDispatchBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl DispatchBus for InProcessDispatchBus {
    async fn publish(&self, message: &DispatchMessage) -> Result<PublishReceipt, BusError> {
        let receipt = self.send(message.clone())?;
        tracing::debug!(
            message_id = %receipt.message_id,
            execution_id = %message.execution_id,
            viewport = %message.mode,
            "Dispatch message published in-process",
        );
        Ok(receipt)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use autobahn_core::viewport::Viewport;

    use super::*;

    fn message(mode: Viewport) -> DispatchMessage {
        DispatchMessage::new("https://example.com", uuid::Uuid::new_v4(), mode)
    }

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = InProcessDispatchBus::default();
        let mut rx = bus.subscribe();

        let sent = message(Viewport::Desktop);
        let receipt = bus.publish(&sent).await.expect("publish should succeed");

        let (id, received) = rx.recv().await.expect("should receive the message");
        assert_eq!(id, receipt.message_id);
        assert_eq!(received, sent);
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_message() {
        let bus = InProcessDispatchBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(&message(Viewport::Mobile)).await.unwrap();

        let (id1, _) = rx1.recv().await.expect("subscriber 1 should receive");
        let (id2, _) = rx2.recv().await.expect("subscriber 2 should receive");
        assert_eq!(id1, id2);
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_an_error() {
        let bus = InProcessDispatchBus::default();
        assert_matches!(
            bus.publish(&message(Viewport::Mobile)).await,
            Err(BusError::NoSubscribers)
        );
    }

    #[tokio::test]
    async fn message_ids_are_unique() {
        let bus = InProcessDispatchBus::default();
        let _rx = bus.subscribe();

        let a = bus.publish(&message(Viewport::Mobile)).await.unwrap();
        let b = bus.publish(&message(Viewport::Mobile)).await.unwrap();
        assert_ne!(a.message_id, b.message_id);
    }
}
