//! Autobahn dispatch bus.
//!
//! Audit work leaves the platform as [`DispatchMessage`]s published on a
//! [`DispatchBus`]. Two implementations are provided:
//!
//! - [`InProcessDispatchBus`]: publish/subscribe hub backed by
//!   `tokio::sync::broadcast`, for workers running in the same process and
//!   for tests.
//! - [`HttpTopicPublisher`]: POSTs each message to a named topic endpoint
//!   with bounded exponential-backoff retry.

pub mod bus;
pub mod topic;

pub use autobahn_core::dispatch::{DispatchMessage, PublishReceipt};
pub use bus::{BusError, DispatchBus, InProcessDispatchBus};
pub use topic::HttpTopicPublisher;
