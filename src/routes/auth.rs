// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login, signup, Google sign-in and logout routes.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    routing::{delete, get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use validator::{Validate, ValidationError};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::{validated, TextResponse};
use crate::error::{AppError, Result};
use crate::middleware::auth::{authenticate, session_tokens, SESSION_COOKIE, TOKEN_COOKIE};
use crate::services::auth::{OidcAuth, PENDING_LOGIN_TTL_MINUTES};
use crate::services::session::SessionGrant;
use crate::AppState;

/// Cookie binding an OIDC redirect to the browser that started it.
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";
const OIDC_CALLBACK_PATH: &str = "/oidauth";
/// bcrypt ignores input past this many bytes.
const BCRYPT_MAX_PASSWORD_BYTES: usize = 72;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root))
        .route("/login", post(login))
        .route("/signup", post(signup))
        .route("/login_google", get(login_google))
        .route(OIDC_CALLBACK_PATH, get(oidc_callback))
        .route("/logout", delete(logout))
}

/// Username/password form.
#[derive(Debug, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CredentialsRequest {
    #[validate(length(min = 1, max = 64, message = "User name must be 1-64 characters"))]
    pub uname: String,
    #[validate(
        length(min = 1, message = "Password must not be empty"),
        custom(function = "password_fits_bcrypt")
    )]
    pub passwd: String,
}

fn password_fits_bcrypt(passwd: &str) -> std::result::Result<(), ValidationError> {
    if passwd.len() > BCRYPT_MAX_PASSWORD_BYTES {
        return Err(ValidationError::new("password_too_long")
            .with_message("Password must be at most 72 bytes".into()));
    }
    Ok(())
}

/// Whether the caller holds a live session.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionStatus {
    pub authenticated: bool,
}

fn session_cookie(
    name: &'static str,
    grant: &SessionGrant,
    now: DateTime<Utc>,
    secure: bool,
) -> Cookie<'static> {
    let max_age = (grant.expire_at - now).num_seconds().max(0);
    Cookie::build((name, grant.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::seconds(max_age))
        .build()
}

fn state_cookie(state: String, secure: bool) -> Cookie<'static> {
    Cookie::build((OAUTH_STATE_COOKIE, state))
        .path(OIDC_CALLBACK_PATH)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::minutes(PENDING_LOGIN_TTL_MINUTES))
        .build()
}

pub(crate) fn clear_session_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(TOKEN_COOKIE).path("/"))
        .remove(Cookie::build(SESSION_COOKIE).path("/"))
}

fn oidc(state: &AppState) -> Result<&OidcAuth> {
    state
        .oidc
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Google sign-in is not configured".to_string()))
}

/// Report whether the request carries a live session.
async fn root(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<Json<SessionStatus>> {
    let authenticated = authenticate(&state, &jar, &headers).await?.is_some();
    Ok(Json(SessionStatus { authenticated }))
}

/// Password login.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    payload: std::result::Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<&'static str>)> {
    let req = validated(payload)?;
    let grant = state.passwords.login(&req.uname, &req.passwd).await?;

    let cookie = session_cookie(
        TOKEN_COOKIE,
        &grant,
        state.clock.now(),
        state.config.is_secure(),
    );
    Ok((jar.add(cookie), Json("/")))
}

/// Create an account and log it in.
async fn signup(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    payload: std::result::Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<&'static str>)> {
    let req = validated(payload)?;
    let user_id = state.passwords.signup(&req.uname, &req.passwd).await?;
    let grant = state.sessions.create(user_id).await?;

    let cookie = session_cookie(
        TOKEN_COOKIE,
        &grant,
        state.clock.now(),
        state.config.is_secure(),
    );
    Ok((jar.add(cookie), Json("/")))
}

/// Start Google sign-in. The body is the URL the client should navigate to.
async fn login_google(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, String)> {
    let redirect = oidc(&state)?.begin_login().await?;

    tracing::info!("Starting Google sign-in");

    let cookie = state_cookie(redirect.state, state.config.is_secure());
    Ok((jar.add(cookie), redirect.authorization_url))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Provider callback: check state, exchange the code, open a session, and
/// send the browser back to the frontend. The state cookie is cleared on
/// every outcome.
async fn oidc_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<Response> {
    let oidc = oidc(&state)?;

    let bound_state = jar
        .get(OAUTH_STATE_COOKIE)
        .map(|cookie| cookie.value().to_string());
    let jar = jar.remove(Cookie::build(OAUTH_STATE_COOKIE).path(OIDC_CALLBACK_PATH));
    let frontend_url = &state.config.frontend_url;

    if let Some(error) = params.error {
        tracing::warn!(error = %error, "Identity provider returned an error");
        let redirect = format!("{}?error={}", frontend_url, urlencoding::encode(&error));
        return Ok((jar, Redirect::to(&redirect)).into_response());
    }

    let returned_state = params.state.unwrap_or_default();
    let state_matches = bound_state.is_some_and(|bound| {
        !bound.is_empty() && bool::from(bound.as_bytes().ct_eq(returned_state.as_bytes()))
    });
    if !state_matches {
        tracing::warn!("OIDC callback state does not match the browser cookie");
        return Ok((jar, AppError::InvalidState).into_response());
    }

    let code = params.code.unwrap_or_default();
    let grant = match oidc.complete_login(&code, &returned_state).await {
        Ok(grant) => grant,
        Err(e) => return Ok((jar, e).into_response()),
    };

    let cookie = session_cookie(
        SESSION_COOKIE,
        &grant,
        state.clock.now(),
        state.config.is_secure(),
    );
    Ok((jar.add(cookie), Redirect::to(frontend_url)).into_response())
}

/// Revoke every session the request carries and clear the cookies.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<(CookieJar, Json<TextResponse>)> {
    let mut revoked = 0;
    for token in session_tokens(&jar, &headers) {
        revoked += state.sessions.revoke(&token).await?;
    }
    if revoked > 0 {
        tracing::info!(revoked, "User logged out");
    }

    Ok((clear_session_cookies(jar), Json(TextResponse::new("/login"))))
}
