// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store.
//!
//! Used for local development (`STORE_BACKEND=memory`) and tests. Ancestor
//! scoping is modelled by including the parent key in the document path.

use crate::db::{generate_id, DocumentStore, EntityId, Fields, Filter, Key};
use crate::error::AppError;
use async_trait::async_trait;
use dashmap::DashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DocPath {
    kind: String,
    parent: Option<Key>,
    id: EntityId,
}

/// Document store backed by a concurrent hash map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: DashMap<DocPath, Fields>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents of `kind` across all parents.
    pub fn count(&self, kind: &str) -> usize {
        self.docs.iter().filter(|entry| entry.key().kind == kind).count()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn put(
        &self,
        kind: &str,
        parent: Option<Key>,
        id: Option<EntityId>,
        fields: Fields,
    ) -> Result<EntityId, AppError> {
        let id = match id {
            Some(id) => id,
            None => generate_id()?,
        };
        self.docs.insert(
            DocPath {
                kind: kind.to_string(),
                parent,
                id,
            },
            fields,
        );
        Ok(id)
    }

    async fn get(
        &self,
        kind: &str,
        id: EntityId,
        parent: Option<Key>,
    ) -> Result<Option<Fields>, AppError> {
        let path = DocPath {
            kind: kind.to_string(),
            parent,
            id,
        };
        Ok(self.docs.get(&path).map(|entry| entry.value().clone()))
    }

    async fn delete(
        &self,
        kind: &str,
        id: EntityId,
        parent: Option<Key>,
    ) -> Result<(), AppError> {
        let path = DocPath {
            kind: kind.to_string(),
            parent,
            id,
        };
        self.docs.remove(&path);
        Ok(())
    }

    async fn query(
        &self,
        kind: &str,
        parent: Option<Key>,
        filters: &[Filter],
    ) -> Result<Vec<(EntityId, Fields)>, AppError> {
        let mut results: Vec<(EntityId, Fields)> = self
            .docs
            .iter()
            .filter(|entry| {
                let path = entry.key();
                path.kind == kind && (parent.is_none() || path.parent == parent)
            })
            .filter(|entry| filters.iter().all(|f| f.matches(entry.value())))
            .map(|entry| (entry.key().id, entry.value().clone()))
            .collect();

        results.sort_by_key(|(id, _)| *id);
        Ok(results)
    }
}
