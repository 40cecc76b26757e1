//! The per-request authentication state machine.
//!
//! A presented token is checked cryptographically first and then reconciled
//! against its stored session. Expiry is two-phase: the first time an expired
//! token is seen its session is flagged, the next sighting deletes the row.
//! All cleanup that accompanies a rejection goes through [`AuthGate::reject`].

use std::sync::Arc;

use serde::Serialize;

use crate::auth::token::TokenService;
use crate::error::AppError;
use crate::session::{SessionStore, StoreError};

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    TokenMissing,
    TokenInvalid,
    SessionNotFound,
    SessionExpired,
    StorageError,
}

impl RejectReason {
    pub fn message(&self) -> &'static str {
        match self {
            RejectReason::TokenMissing => "Token not found",
            RejectReason::TokenInvalid => "Invalid token",
            RejectReason::SessionNotFound => "Invalid session",
            RejectReason::SessionExpired => "Session expired",
            RejectReason::StorageError => "Internal Server Error",
        }
    }

    /// Whether the client should throw its token away.
    pub fn is_expired(&self) -> bool {
        match self {
            RejectReason::TokenMissing
            | RejectReason::TokenInvalid
            | RejectReason::SessionNotFound
            | RejectReason::SessionExpired
            | RejectReason::StorageError => true,
        }
    }
}

/// What a protected handler learns about the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: i32,
    pub token: String,
}

/// Side effect run on the session row when rejecting.
#[derive(Debug, Clone, Copy)]
enum Cleanup {
    /// Best-effort delete; failure is logged only.
    Remove,
    /// Best-effort flag; failure is logged only.
    MarkExpired,
    /// Delete that must succeed, otherwise the rejection becomes a storage error.
    Purge,
}

pub struct AuthGate {
    tokens: TokenService,
    sessions: Arc<dyn SessionStore>,
}

impl AuthGate {
    pub fn new(tokens: TokenService, sessions: Arc<dyn SessionStore>) -> Self {
        Self { tokens, sessions }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn sessions(&self) -> &dyn SessionStore {
        self.sessions.as_ref()
    }

    /// Issues a token for a freshly authenticated user and records its session.
    pub async fn start_session(&self, user_id: i32, identity: &str) -> Result<String, AppError> {
        let token = self.tokens.issue(identity)?;
        self.sessions.create(&token, user_id).await?;
        log::info!("session started for user {} ({})", user_id, token_hint(&token));
        Ok(token)
    }

    /// Resolves a presented bearer token into the caller's identity.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<AuthContext, RejectReason> {
        let token = match token {
            Some(token) if !token.is_empty() => token,
            _ => return Err(RejectReason::TokenMissing),
        };

        let verified = match self.tokens.verify(token) {
            Ok(verified) => verified,
            Err(err) => {
                log::debug!("token {} failed verification: {}", token_hint(token), err);
                return Err(self
                    .reject(token, RejectReason::TokenInvalid, Cleanup::Remove)
                    .await);
            }
        };

        let session = match self.sessions.find(token).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                return Err(self
                    .reject(token, RejectReason::SessionNotFound, Cleanup::Remove)
                    .await)
            }
            Err(err) => {
                log::error!("session lookup for {} failed: {}", token_hint(token), err);
                return Err(RejectReason::StorageError);
            }
        };

        if session.is_expired {
            return Err(self
                .reject(token, RejectReason::SessionExpired, Cleanup::Purge)
                .await);
        }

        if verified.is_expired {
            return Err(self
                .reject(token, RejectReason::SessionExpired, Cleanup::MarkExpired)
                .await);
        }

        Ok(AuthContext {
            user_id: session.user_id,
            token: token.to_string(),
        })
    }

    /// Ends a session. Succeeds whether or not the session still existed.
    pub async fn logout(&self, token: &str) -> Result<(), StoreError> {
        self.sessions.remove(token).await?;
        log::info!("session {} logged out", token_hint(token));
        Ok(())
    }

    /// Runs the cleanup tied to a rejection and returns the final reason.
    async fn reject(&self, token: &str, reason: RejectReason, cleanup: Cleanup) -> RejectReason {
        let result = match cleanup {
            Cleanup::Remove | Cleanup::Purge => self.sessions.remove(token).await,
            Cleanup::MarkExpired => self.sessions.mark_expired(token).await,
        };

        match (result, cleanup) {
            (Ok(()), _) => {
                log::debug!("rejected {}: {:?}", token_hint(token), reason);
                reason
            }
            (Err(err), Cleanup::Purge) => {
                log::error!("could not purge expired session {}: {}", token_hint(token), err);
                RejectReason::StorageError
            }
            (Err(err), _) => {
                log::warn!(
                    "{:?} cleanup for {} failed: {}",
                    cleanup,
                    token_hint(token),
                    err
                );
                reason
            }
        }
    }
}

/// Tail of a token, safe to put in logs.
fn token_hint(token: &str) -> String {
    let tail: String = token
        .chars()
        .rev()
        .take(8)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("…{}", tail)
}
