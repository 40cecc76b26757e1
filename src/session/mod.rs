//! Durable session records keyed by bearer token.
//!
//! Every operation touches exactly one record, so each backend only has to
//! make single-key writes atomic. `mark_expired` and `remove` are idempotent:
//! acting on a token that has no record is a success, which lets concurrent
//! requests clean up the same session without coordinating.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use thiserror::Error;

pub use memory::MemorySessionStore;
pub use postgres::PgSessionStore;

/// A persisted session, one per issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Session {
    pub token: String,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    /// Set once the token was seen after its expiry; the row is purged on the next sighting.
    pub is_expired: bool,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a session already exists for this token")]
    Duplicate,
    #[error("session storage failure: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> StoreError {
        match &error {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate,
            _ => StoreError::Backend(error.to_string()),
        }
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Inserts a fresh, unexpired session for `token`.
    async fn create(&self, token: &str, user_id: i32) -> Result<Session, StoreError>;

    /// Looks a session up. A miss is `Ok(None)`, not an error.
    async fn find(&self, token: &str) -> Result<Option<Session>, StoreError>;

    /// Flags the session as expired, keeping the row.
    async fn mark_expired(&self, token: &str) -> Result<(), StoreError>;

    /// Deletes the session.
    async fn remove(&self, token: &str) -> Result<(), StoreError>;

    /// Short backend name, reported by the health endpoint.
    fn backend(&self) -> &'static str;
}
