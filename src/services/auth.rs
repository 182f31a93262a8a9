// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login flows: username/password and OIDC.
//!
//! Both end in a [`SessionGrant`] from the session manager. The OIDC flow
//! keeps one [`PendingLogin`] per outstanding redirect, so concurrent logins
//! never clobber each other's state.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Duration;
use std::sync::Arc;

use crate::db::{collections, DocumentStore, EntityId, Filter};
use crate::error::AppError;
use crate::models::{from_fields, to_fields, Credential, PendingLogin, User};
use crate::services::crypto::{hash_password, random_bytes, random_hex, verify_password};
use crate::services::google_oidc::IdentityProvider;
use crate::services::session::{SessionGrant, SessionManager};
use crate::time_utils::{format_utc_rfc3339, Clock};

/// How long a login redirect stays redeemable.
pub const PENDING_LOGIN_TTL_MINUTES: i64 = 10;
const STATE_BYTES: usize = 32;
const NONCE_BYTES: usize = 16;

/// Username/password accounts.
#[derive(Clone)]
pub struct PasswordAuth {
    store: Arc<dyn DocumentStore>,
    sessions: SessionManager,
    clock: Arc<dyn Clock>,
    bcrypt_cost: u32,
}

impl PasswordAuth {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        sessions: SessionManager,
        clock: Arc<dyn Clock>,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            store,
            sessions,
            clock,
            bcrypt_cost,
        }
    }

    /// Register a new user. Usernames are unique.
    ///
    /// The uniqueness check and the insert are two separate store calls, so
    /// two simultaneous signups for one name can both succeed.
    pub async fn signup(&self, username: &str, password: &str) -> Result<EntityId, AppError> {
        check_credentials(username, password)?;

        if self.find_by_username(username).await?.is_some() {
            tracing::info!(username = %username, "Signup rejected: username taken");
            return Err(AppError::AlreadyExists);
        }

        let hash = hash_password(password, self.bcrypt_cost).await?;
        let user = User::with_password(username, hash, format_utc_rfc3339(self.clock.now()))?;
        let user_id = self
            .store
            .put(collections::USERS, None, None, to_fields(&user)?)
            .await?;

        tracing::info!(user_id, username = %username, "User signed up");
        Ok(user_id)
    }

    /// Check a username/password pair and open a session.
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionGrant, AppError> {
        check_credentials(username, password)?;

        let Some(user) = self.find_by_username(username).await? else {
            tracing::info!(username = %username, "Login failed: unknown user");
            return Err(AppError::InvalidCredentials);
        };

        let Credential::Password { password_hash, .. } = &user.credential else {
            return Err(AppError::InvalidCredentials);
        };

        if !verify_password(password, password_hash).await? {
            tracing::info!(user_id = user.id, "Login failed: wrong password");
            return Err(AppError::InvalidCredentials);
        }

        let grant = self.sessions.create(user.id).await?;
        tracing::info!(user_id = user.id, "User logged in");
        Ok(grant)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let matches = self
            .store
            .query(
                collections::USERS,
                None,
                &[Filter::eq("username", username)],
            )
            .await?;

        matches
            .into_iter()
            .next()
            .map(|(id, fields)| {
                let mut user: User = from_fields(fields)?;
                user.id = id;
                Ok(user)
            })
            .transpose()
    }
}

fn check_credentials(username: &str, password: &str) -> Result<(), AppError> {
    if username.trim().is_empty() {
        return Err(AppError::Validation("User name cannot be empty!".to_string()));
    }
    if password.is_empty() {
        return Err(AppError::Validation("Password cannot be empty!".to_string()));
    }
    Ok(())
}

/// Redirect issued by [`OidcAuth::begin_login`].
#[derive(Debug, Clone)]
pub struct LoginRedirect {
    pub state: String,
    pub authorization_url: String,
}

/// OIDC login against an external identity provider.
#[derive(Clone)]
pub struct OidcAuth {
    store: Arc<dyn DocumentStore>,
    sessions: SessionManager,
    clock: Arc<dyn Clock>,
    provider: Arc<dyn IdentityProvider>,
}

impl OidcAuth {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        sessions: SessionManager,
        clock: Arc<dyn Clock>,
        provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            store,
            sessions,
            clock,
            provider,
        }
    }

    /// Record a fresh pending login and build the provider redirect.
    pub async fn begin_login(&self) -> Result<LoginRedirect, AppError> {
        let now = self.clock.now();
        let state = random_hex(STATE_BYTES)?;
        let nonce = URL_SAFE_NO_PAD.encode(random_bytes(NONCE_BYTES)?);
        let pending = PendingLogin::new(
            state.clone(),
            nonce.clone(),
            now,
            now + Duration::minutes(PENDING_LOGIN_TTL_MINUTES),
        );

        self.store
            .put(collections::PENDING_LOGINS, None, None, to_fields(&pending)?)
            .await?;

        tracing::debug!("OIDC login started");

        Ok(LoginRedirect {
            authorization_url: self.provider.authorization_url(&state, &nonce),
            state,
        })
    }

    /// Finish a login from the provider callback.
    pub async fn complete_login(&self, code: &str, state: &str) -> Result<SessionGrant, AppError> {
        let pending = self.take_pending(state).await?;

        if code.is_empty() {
            return Err(AppError::Validation("Missing authorization code".to_string()));
        }

        let login = self.provider.exchange_code(code, &pending.nonce).await?;
        let user_id = self
            .find_or_create_user(&login.subject, &login.email)
            .await?;

        let expire_at = i64::try_from(login.expires_in)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|ttl| self.clock.now().checked_add_signed(ttl))
            .ok_or_else(|| {
                AppError::IdentityProvider(format!(
                    "Unusable expires_in from provider: {}",
                    login.expires_in
                ))
            })?;
        let grant = self
            .sessions
            .create_with_token(user_id, login.access_token, expire_at)
            .await?;

        tracing::info!(user_id, "OIDC login completed");
        Ok(grant)
    }

    /// Delete login redirects nobody came back from.
    pub async fn sweep_expired(&self) -> Result<usize, AppError> {
        let now = format_utc_rfc3339(self.clock.now());
        let stale = self
            .store
            .query(
                collections::PENDING_LOGINS,
                None,
                &[Filter::le("expire_at", now)],
            )
            .await?;

        let count = stale.len();
        for (id, _) in stale {
            self.store
                .delete(collections::PENDING_LOGINS, id, None)
                .await?;
        }
        Ok(count)
    }

    /// Consume the pending login for `state`. Every match is deleted, so a
    /// state value can be redeemed at most once.
    async fn take_pending(&self, state: &str) -> Result<PendingLogin, AppError> {
        if state.is_empty() {
            return Err(AppError::InvalidState);
        }

        let matches = self
            .store
            .query(
                collections::PENDING_LOGINS,
                None,
                &[Filter::eq("state", state)],
            )
            .await?;

        let now = self.clock.now();
        let mut live = None;
        for (id, fields) in matches {
            self.store
                .delete(collections::PENDING_LOGINS, id, None)
                .await?;
            let pending: PendingLogin = from_fields(fields)?;
            if pending.state == state && !pending.is_expired(now) && live.is_none() {
                live = Some(pending);
            }
        }

        live.ok_or_else(|| {
            tracing::warn!("OIDC callback with unknown or expired state");
            AppError::InvalidState
        })
    }

    async fn find_or_create_user(&self, subject: &str, email: &str) -> Result<EntityId, AppError> {
        let existing = self
            .store
            .query(collections::USERS, None, &[Filter::eq("subject", subject)])
            .await?;

        if let Some((id, _)) = existing.into_iter().next() {
            return Ok(id);
        }

        let user = User::with_oidc(subject, email, format_utc_rfc3339(self.clock.now()))?;
        let id = self
            .store
            .put(collections::USERS, None, None, to_fields(&user)?)
            .await?;

        tracing::info!(user_id = id, email = %email, "OIDC user created");
        Ok(id)
    }
}
