use async_trait::async_trait;
use sqlx::PgPool;

use super::{Session, SessionStore, StoreError};

/// Sessions kept in the `sessions` table. Each operation is a single statement.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, token: &str, user_id: i32) -> Result<Session, StoreError> {
        let session = sqlx::query_as::<_, Session>(
            "INSERT INTO sessions (token, user_id) VALUES ($1, $2)
             RETURNING token, user_id, created_at, is_expired",
        )
        .bind(token)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(session)
    }

    async fn find(&self, token: &str) -> Result<Option<Session>, StoreError> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT token, user_id, created_at, is_expired FROM sessions WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn mark_expired(&self, token: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE sessions SET is_expired = TRUE WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn remove(&self, token: &str) -> Result<(), StoreError> {
        // Zero affected rows is fine: someone else already removed it.
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
