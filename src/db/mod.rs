// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Document store layer.
//!
//! Entities are addressed by kind + numeric ID, optionally scoped under a
//! parent key. The core only talks to [`DocumentStore`]; Firestore and an
//! in-process map are the two backends.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use async_trait::async_trait;
use ring::rand::{SecureRandom, SystemRandom};

/// Collection (kind) names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Child of `users`
    pub const EVENTS: &str = "events";
    /// Child of `users`
    pub const SESSIONS: &str = "sessions";
    pub const PENDING_LOGINS: &str = "pending_logins";
}

/// Numeric entity ID.
pub type EntityId = u64;

/// Raw document fields.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Parent key used for ancestor scoping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    pub kind: &'static str,
    pub id: EntityId,
}

impl Key {
    pub fn user(id: EntityId) -> Self {
        Self {
            kind: collections::USERS,
            id,
        }
    }
}

/// Comparison operator of a query filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Equal,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

/// A `(field, op, value)` query filter over string-valued fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: String,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, FilterOp::Equal, value)
    }

    pub fn le(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, FilterOp::LessThanOrEqual, value)
    }

    /// Whether a stored field value satisfies this filter.
    pub fn matches(&self, fields: &Fields) -> bool {
        let Some(stored) = fields.get(&self.field).and_then(value_as_str) else {
            return false;
        };
        let stored = stored.as_str();
        let value = self.value.as_str();
        match self.op {
            FilterOp::Equal => stored == value,
            FilterOp::LessThan => stored < value,
            FilterOp::LessThanOrEqual => stored <= value,
            FilterOp::GreaterThan => stored > value,
            FilterOp::GreaterThanOrEqual => stored >= value,
        }
    }
}

fn value_as_str(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Minimal document store contract required by the core.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Write a document. Generates an ID when `id` is `None`, upserts otherwise.
    async fn put(
        &self,
        kind: &str,
        parent: Option<Key>,
        id: Option<EntityId>,
        fields: Fields,
    ) -> Result<EntityId, AppError>;

    /// Read one document.
    async fn get(
        &self,
        kind: &str,
        id: EntityId,
        parent: Option<Key>,
    ) -> Result<Option<Fields>, AppError>;

    /// Delete one document. Missing documents are not an error.
    async fn delete(&self, kind: &str, id: EntityId, parent: Option<Key>)
        -> Result<(), AppError>;

    /// Query documents of `kind`. With no parent, every document of that
    /// kind is searched regardless of its ancestor.
    async fn query(
        &self,
        kind: &str,
        parent: Option<Key>,
        filters: &[Filter],
    ) -> Result<Vec<(EntityId, Fields)>, AppError>;
}

// IDs stay below 2^53 so they survive a round trip through JavaScript clients.
const MAX_ENTITY_ID: u64 = 1 << 53;

/// Generate a random entity ID in `1..2^53`.
pub fn generate_id() -> Result<EntityId, AppError> {
    let mut bytes = [0u8; 8];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
    Ok(u64::from_le_bytes(bytes) % (MAX_ENTITY_ID - 1) + 1)
}
