// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Event Reminder: personal countdowns to upcoming dates
//!
//! This crate provides the JSON API behind the reminder app: password and
//! Google sign-in, per-user event storage, and resolution of partial dates
//! like `06/15` to their next occurrence.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::DocumentStore;
use error::AppError;
use services::{
    AccountService, EventRepository, IdentityProvider, OidcAuth, PasswordAuth, SessionManager,
    Sweeper,
};
use std::sync::Arc;
use time_utils::Clock;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub clock: Arc<dyn Clock>,
    pub sessions: SessionManager,
    pub events: EventRepository,
    pub passwords: PasswordAuth,
    /// `None` when no identity provider is configured
    pub oidc: Option<OidcAuth>,
    pub accounts: AccountService,
}

impl AppState {
    /// Wire every service onto one store and clock.
    pub fn new(
        config: Config,
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        provider: Option<Arc<dyn IdentityProvider>>,
    ) -> Result<Self, AppError> {
        let sessions = SessionManager::new(store.clone(), clock.clone(), config.session_ttl)?;
        let events = EventRepository::new(store.clone(), clock.clone());
        let passwords = PasswordAuth::new(
            store.clone(),
            sessions.clone(),
            clock.clone(),
            config.bcrypt_cost,
        );
        let oidc = provider.map(|provider| {
            OidcAuth::new(store.clone(), sessions.clone(), clock.clone(), provider)
        });
        let accounts = AccountService::new(store, events.clone(), sessions.clone());

        Ok(Self {
            config,
            clock,
            sessions,
            events,
            passwords,
            oidc,
            accounts,
        })
    }

    /// Background sweeper over this state's services.
    pub fn sweeper(&self) -> Sweeper {
        Sweeper::new(
            self.sessions.clone(),
            self.events.clone(),
            self.oidc.clone(),
        )
    }

    #[cfg(test)]
    pub(crate) fn for_tests(config: Config) -> Self {
        let store = Arc::new(db::MemoryStore::new());
        let clock = Arc::new(time_utils::SystemClock);
        Self::new(config, store, clock, None).expect("test state")
    }
}
