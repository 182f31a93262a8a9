// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session token lifecycle.
//!
//! Sessions are stored under their owner. A token moves from active to
//! deleted only as a side effect of `validate` (once expired), `revoke`,
//! the optional sweeper, or account deletion. Validation never extends
//! the expiry.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::db::{collections, DocumentStore, EntityId, Filter, Key};
use crate::error::AppError;
use crate::models::{from_fields, to_fields, Session};
use crate::services::crypto::random_alphanumeric;
use crate::time_utils::{format_utc_rfc3339, Clock};

/// Length of generated session tokens.
pub const TOKEN_LENGTH: usize = 32;

/// A freshly issued session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionGrant {
    pub token: String,
    pub owner_id: EntityId,
    pub expire_at: DateTime<Utc>,
}

/// Issues, validates, expires and revokes session tokens.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    ttl: chrono::Duration,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        ttl: std::time::Duration,
    ) -> Result<Self, AppError> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid session TTL: {}", e)))?;
        Ok(Self { store, clock, ttl })
    }

    /// Issue a random token valid for the configured TTL.
    pub async fn create(&self, owner_id: EntityId) -> Result<SessionGrant, AppError> {
        let token = random_alphanumeric(TOKEN_LENGTH)?;
        let expire_at = self.clock.now() + self.ttl;
        self.create_with_token(owner_id, token, expire_at).await
    }

    /// Store an externally issued token (an OIDC access token) with the
    /// provider-controlled expiry.
    pub async fn create_with_token(
        &self,
        owner_id: EntityId,
        token: String,
        expire_at: DateTime<Utc>,
    ) -> Result<SessionGrant, AppError> {
        if token.is_empty() {
            return Err(AppError::Internal(anyhow::anyhow!("Refusing empty session token")));
        }

        let session = Session::new(token.clone(), owner_id, self.clock.now(), expire_at);
        self.store
            .put(
                collections::SESSIONS,
                Some(Key::user(owner_id)),
                None,
                to_fields(&session)?,
            )
            .await?;

        tracing::debug!(owner_id, expire_at = %session.expire_at, "Session created");

        Ok(SessionGrant {
            token,
            owner_id,
            expire_at,
        })
    }

    /// Resolve a token to its owner.
    ///
    /// Expired matches are deleted and skipped. Duplicate tokens are
    /// tolerated: the first live match wins.
    pub async fn validate(&self, token: &str) -> Result<Option<EntityId>, AppError> {
        if token.is_empty() {
            return Ok(None);
        }

        let now = self.clock.now();
        let matches = self
            .store
            .query(collections::SESSIONS, None, &[Filter::eq("token", token)])
            .await?;

        let mut owner = None;
        for (id, fields) in matches {
            let session: Session = from_fields(fields)?;
            if session.is_expired(now) {
                self.store
                    .delete(
                        collections::SESSIONS,
                        id,
                        Some(Key::user(session.owner_id)),
                    )
                    .await?;
                tracing::debug!(owner_id = session.owner_id, "Expired session removed");
                continue;
            }
            if owner.is_none() {
                owner = Some(session.owner_id);
            }
        }

        Ok(owner)
    }

    /// Delete every session carrying `token`. Returns how many were removed.
    pub async fn revoke(&self, token: &str) -> Result<usize, AppError> {
        if token.is_empty() {
            return Ok(0);
        }

        let matches = self
            .store
            .query(collections::SESSIONS, None, &[Filter::eq("token", token)])
            .await?;

        let count = matches.len();
        for (id, fields) in matches {
            let session: Session = from_fields(fields)?;
            self.store
                .delete(collections::SESSIONS, id, Some(Key::user(session.owner_id)))
                .await?;
        }

        tracing::debug!(count, "Session revoked");
        Ok(count)
    }

    /// Delete every session of one user.
    pub async fn revoke_all_for(&self, owner_id: EntityId) -> Result<usize, AppError> {
        let parent = Key::user(owner_id);
        let sessions = self
            .store
            .query(collections::SESSIONS, Some(parent), &[])
            .await?;

        let count = sessions.len();
        for (id, _) in sessions {
            self.store
                .delete(collections::SESSIONS, id, Some(parent))
                .await?;
        }
        Ok(count)
    }

    /// Delete every session whose expiry has passed.
    pub async fn sweep_expired(&self) -> Result<usize, AppError> {
        let now = format_utc_rfc3339(self.clock.now());
        let expired = self
            .store
            .query(collections::SESSIONS, None, &[Filter::le("expire_at", now)])
            .await?;

        let count = expired.len();
        for (id, fields) in expired {
            let session: Session = from_fields(fields)?;
            self.store
                .delete(collections::SESSIONS, id, Some(Key::user(session.owner_id)))
                .await?;
        }
        Ok(count)
    }
}
