// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account removal.

use std::sync::Arc;

use crate::db::{collections, DocumentStore, EntityId};
use crate::error::AppError;
use crate::services::events::EventRepository;
use crate::services::session::SessionManager;

/// What an account deletion removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeletionSummary {
    pub events: usize,
    pub sessions: usize,
}

/// Deletes a user together with everything stored under it.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn DocumentStore>,
    events: EventRepository,
    sessions: SessionManager,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        events: EventRepository,
        sessions: SessionManager,
    ) -> Self {
        Self {
            store,
            events,
            sessions,
        }
    }

    /// Delete the user's events, then sessions, then the user record.
    ///
    /// The user goes last so a failure part way leaves a record that a
    /// retry can still find.
    pub async fn delete_user(&self, user_id: EntityId) -> Result<DeletionSummary, AppError> {
        let events = self.events.remove_all_for(user_id).await?;
        let sessions = self.sessions.revoke_all_for(user_id).await?;
        self.store.delete(collections::USERS, user_id, None).await?;

        tracing::info!(user_id, events, sessions, "Account deleted");
        Ok(DeletionSummary { events, sessions })
    }
}
