//! Execution orchestration and fan-out for autobahn audits.
//!
//! The [`ExecutionOrchestrator`] coordinates three loosely consistent
//! stores: the system of record ([`ExecutionStore`]), the dispatch bus
//! ([`DispatchBus`](autobahn_events::DispatchBus)) and the connection
//! directory ([`ConnectionDirectory`]). Every operation runs in two phases:
//!
//! 1. **commit**: rows are written; any failure aborts the operation.
//! 2. **notify**: dispatch messages are published and live connections are
//!    told to refresh via the [`FanoutBroadcaster`]. Failures here are logged
//!    and swallowed; the committed rows are the source of truth.
//!
//! All collaborators are trait objects injected at construction so the
//! binary wires Postgres/HTTP/WebSocket implementations and tests wire the
//! in-memory ones from [`memory`].

pub mod broadcaster;
pub mod directory;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod orchestrator;
pub mod store;

pub use broadcaster::{BroadcastOutcome, FanoutBroadcaster};
pub use directory::{ConnectionDirectory, DirectoryError, PgConnectionDirectory};
pub use error::{OrchestrationError, StoreError};
pub use gateway::{NotificationGateway, PushError};
pub use orchestrator::{CreateExecution, CreatedExecution, ExecutionOrchestrator, RetryOutcome};
pub use store::{ExecutionStore, PgExecutionStore};
