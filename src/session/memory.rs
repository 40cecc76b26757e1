use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{Session, SessionStore, StoreError};

/// Process-local session store. Sessions are lost on restart.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held, flagged ones included.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, token: &str, user_id: i32) -> Result<Session, StoreError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(token) {
            return Err(StoreError::Duplicate);
        }

        let session = Session {
            token: token.to_string(),
            user_id,
            created_at: Utc::now(),
            is_expired: false,
        };
        sessions.insert(token.to_string(), session.clone());
        Ok(session)
    }

    async fn find(&self, token: &str) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.read().await.get(token).cloned())
    }

    async fn mark_expired(&self, token: &str) -> Result<(), StoreError> {
        if let Some(session) = self.sessions.write().await.get_mut(token) {
            session.is_expired = true;
        }
        Ok(())
    }

    async fn remove(&self, token: &str) -> Result<(), StoreError> {
        self.sessions.write().await.remove(token);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
