// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Event model for storage and API.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::EntityId;
use crate::error::AppError;

/// Stored event record, child of its owner in the `events` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(skip)]
    pub id: EntityId,
    /// Owning user ID (also the parent key)
    pub owner_id: EntityId,
    /// Event name
    pub name: String,
    /// Fully-resolved calendar date; the event happens at midnight UTC
    pub date: NaiveDate,
}

impl Event {
    pub fn new(owner_id: EntityId, name: &str, date: NaiveDate) -> Result<Self, AppError> {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Name cannot be empty!".to_string()));
        }
        Ok(Self {
            id: 0,
            owner_id,
            name: name.to_string(),
            date,
        })
    }
}

/// Event as returned by `GET /events`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EventView {
    #[serde(rename = "ID")]
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: EntityId,
    pub name: String,
    /// `MM/DD/YYYY`
    pub date: String,
    /// Countdown, e.g. `3:04:05 left.` or `12 days later.`
    #[serde(rename = "ETA")]
    pub eta: String,
}
