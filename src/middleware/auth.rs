// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session authentication middleware.

use crate::db::EntityId;
use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Cookie set by username/password login.
pub const TOKEN_COOKIE: &str = "token";
/// Cookie set by OIDC login.
pub const SESSION_COOKIE: &str = "session";

/// Authenticated user resolved from the session token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: EntityId,
}

/// Session tokens carried by a request, in the order they are tried:
/// `token` cookie, `session` cookie, then `Authorization: Bearer`.
/// A browser can hold both cookies, and either one may be stale.
pub fn session_tokens(jar: &CookieJar, headers: &HeaderMap) -> Vec<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim);

    let mut tokens: Vec<String> = Vec::new();
    let candidates = [TOKEN_COOKIE, SESSION_COOKIE]
        .iter()
        .filter_map(|name| jar.get(name).map(|cookie| cookie.value()))
        .chain(bearer);
    for token in candidates {
        if !token.is_empty() && !tokens.iter().any(|seen| seen == token) {
            tokens.push(token.to_string());
        }
    }
    tokens
}

/// Owner of the first candidate token that maps to a live session.
pub async fn authenticate(
    state: &AppState,
    jar: &CookieJar,
    headers: &HeaderMap,
) -> Result<Option<EntityId>, AppError> {
    for token in session_tokens(jar, headers) {
        if let Some(user_id) = state.sessions.validate(&token).await? {
            return Ok(Some(user_id));
        }
    }
    Ok(None)
}

/// Middleware that requires a live session.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = authenticate(&state, &jar, request.headers())
        .await?
        .ok_or(AppError::Unauthenticated)?;

    request.extensions_mut().insert(AuthUser { user_id });

    Ok(next.run(request).await)
}
