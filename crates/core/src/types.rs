/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Externally stable identifier of a pulse (one logical execution).
pub type ExecutionId = uuid::Uuid;
