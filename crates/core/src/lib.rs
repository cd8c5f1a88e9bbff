//! Shared domain types for the autobahn audit platform.
//!
//! This crate carries no I/O. It defines the vocabulary every other crate
//! speaks: identifiers, the [`Viewport`](viewport::Viewport) discriminator,
//! the caller identity handed in by the auth boundary, and the wire shapes
//! of dispatch messages and refresh signals.

pub mod dispatch;
pub mod error;
pub mod identity;
pub mod signal;
pub mod types;
pub mod viewport;
