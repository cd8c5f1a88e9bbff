//! Request handlers.
//!
//! Each submodule provides async handler functions for one resource.
//! Execution handlers delegate to the
//! [`ExecutionOrchestrator`](autobahn_pipeline::ExecutionOrchestrator);
//! read-only lookups go straight to the repositories in `autobahn_db`.
//! Errors are mapped via [`AppError`](crate::error::AppError).

pub mod executions;
pub mod me;
pub mod targets;
