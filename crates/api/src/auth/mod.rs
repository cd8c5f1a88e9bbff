//! Identity token validation.
//!
//! Tokens are issued by an external identity provider; this service only
//! verifies them.

pub mod jwt;
