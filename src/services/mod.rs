// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod account;
pub mod auth;
pub mod crypto;
pub mod events;
pub mod google_oidc;
pub mod recurrence;
pub mod session;
pub mod sweeper;

pub use account::AccountService;
pub use auth::{LoginRedirect, OidcAuth, PasswordAuth};
pub use events::EventRepository;
pub use google_oidc::{GoogleIdentityProvider, IdentityProvider, OidcError, VerifiedLogin};
pub use recurrence::{resolve_date, RecurrenceError};
pub use session::{SessionGrant, SessionManager};
pub use sweeper::Sweeper;
