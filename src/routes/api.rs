// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::auth::clear_session_cookies;
use super::{validated, TextResponse};
use crate::db::EntityId;
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::EventView;
use crate::services::recurrence::resolve_date;
use crate::AppState;

/// API routes (require a session).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", get(list_events))
        .route("/event", post(create_event))
        .route("/event/{id}", delete(delete_event))
        .route("/account", delete(delete_account))
}

// ─── Events ──────────────────────────────────────────────────

/// New event form. `date` is `MM/DD`, `MM/DD/YYYY` or `YYYY/MM/DD`.
#[derive(Debug, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct NewEventRequest {
    #[validate(length(min = 1, max = 200, message = "Event name must be 1-200 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 32, message = "Date is required"))]
    pub date: String,
}

/// Upcoming events, soonest first.
async fn list_events(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<EventView>>> {
    let events = state.events.list(user.user_id).await?;
    Ok(Json(events))
}

async fn create_event(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<NewEventRequest>, JsonRejection>,
) -> Result<Json<TextResponse>> {
    let req = validated(payload)?;
    let date = resolve_date(&req.date, state.clock.now())?;
    let id = state.events.add(user.user_id, &req.name, date).await?;

    Ok(Json(TextResponse::new(format!(
        "Success! The unique ID of the new event is {}",
        id
    ))))
}

async fn delete_event(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(event_id): Path<EntityId>,
) -> Result<Json<TextResponse>> {
    state.events.remove(user.user_id, event_id).await?;
    Ok(Json(TextResponse::new(
        "Success! Target event has been deleted!",
    )))
}

// ─── Account Deletion ────────────────────────────────────────

/// Response for account deletion.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteAccountResponse {
    pub success: bool,
    pub events_deleted: usize,
    pub sessions_deleted: usize,
}

/// Delete the user with all of their events and sessions.
async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<DeleteAccountResponse>)> {
    tracing::info!(user_id = user.user_id, "User-initiated account deletion");

    let summary = state.accounts.delete_user(user.user_id).await?;

    Ok((
        clear_session_cookies(jar),
        Json(DeleteAccountResponse {
            success: true,
            events_deleted: summary.events,
            sessions_deleted: summary.sessions,
        }),
    ))
}
