//! Request extractors guarding handlers.
//!
//! - [`auth::AuthUser`] -- the caller identity from a JWT Bearer token.
//! - [`worker::WorkerAuth`] -- a worker presenting the shared `x-worker-token`.

pub mod auth;
pub mod worker;
