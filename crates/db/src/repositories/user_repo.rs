use sqlx::PgPool;

use crate::models::user::User;

const COLUMNS: &str = "id, sub, email, name, last_name, created_at";

pub struct UserRepo;

impl UserRepo {
    /// Find a live user by identity-provider subject.
    pub async fn find_by_sub(pool: &PgPool, sub: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE sub = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, User>(&query)
            .bind(sub)
            .fetch_optional(pool)
            .await
    }
}
