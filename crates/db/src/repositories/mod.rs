//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` (or an open transaction) as the first argument.

pub mod connection_repo;
pub mod heartbeat_repo;
pub mod membership_repo;
pub mod pulse_repo;
pub mod target_repo;
pub mod url_repo;
pub mod user_repo;

pub use connection_repo::ConnectionRepo;
pub use heartbeat_repo::HeartbeatRepo;
pub use membership_repo::MembershipRepo;
pub use pulse_repo::PulseRepo;
pub use target_repo::TargetRepo;
pub use url_repo::UrlRepo;
pub use user_repo::UserRepo;
