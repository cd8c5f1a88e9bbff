//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` / plain DTOs for inserts and updates

pub mod connection;
pub mod heartbeat;
pub mod membership;
pub mod pulse;
pub mod status;
pub mod target;
pub mod url;
pub mod user;
