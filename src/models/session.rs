// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Session and pending-login records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::EntityId;
use crate::time_utils::{format_utc_rfc3339, parse_utc_rfc3339};

/// Login session, child of its owner in the `sessions` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque bearer token (lookup key)
    pub token: String,
    /// Owning user ID
    pub owner_id: EntityId,
    /// Issue time (RFC3339)
    pub issued_at: String,
    /// Expiry time (RFC3339)
    pub expire_at: String,
}

impl Session {
    pub fn new(
        token: String,
        owner_id: EntityId,
        issued_at: DateTime<Utc>,
        expire_at: DateTime<Utc>,
    ) -> Self {
        Self {
            token,
            owner_id,
            issued_at: format_utc_rfc3339(issued_at),
            expire_at: format_utc_rfc3339(expire_at),
        }
    }

    /// A session is expired once `now >= expire_at`. Unparseable expiry counts as expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        parse_utc_rfc3339(&self.expire_at)
            .map(|expire_at| now >= expire_at)
            .unwrap_or(true)
    }
}

/// Outstanding OIDC login, keyed by its random `state` value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingLogin {
    pub state: String,
    /// Nonce that must come back inside the ID token
    pub nonce: String,
    pub issued_at: String,
    pub expire_at: String,
}

impl PendingLogin {
    pub fn new(
        state: String,
        nonce: String,
        issued_at: DateTime<Utc>,
        expire_at: DateTime<Utc>,
    ) -> Self {
        Self {
            state,
            nonce,
            issued_at: format_utc_rfc3339(issued_at),
            expire_at: format_utc_rfc3339(expire_at),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        parse_utc_rfc3339(&self.expire_at)
            .map(|expire_at| now >= expire_at)
            .unwrap_or(true)
    }
}
