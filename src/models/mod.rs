// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod event;
pub mod session;
pub mod user;

pub use event::{Event, EventView};
pub use session::{PendingLogin, Session};
pub use user::{Credential, User};

use crate::db::Fields;
use crate::error::AppError;
use serde::{de::DeserializeOwned, Serialize};

/// Convert a typed record into raw document fields.
pub(crate) fn to_fields<T: Serialize>(record: &T) -> Result<Fields, AppError> {
    match serde_json::to_value(record)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode record: {}", e)))?
    {
        serde_json::Value::Object(fields) => Ok(fields),
        _ => Err(AppError::Internal(anyhow::anyhow!(
            "Record did not encode to an object"
        ))),
    }
}

/// Decode raw document fields into a typed record.
pub(crate) fn from_fields<T: DeserializeOwned>(fields: Fields) -> Result<T, AppError> {
    serde_json::from_value(serde_json::Value::Object(fields))
        .map_err(|e| AppError::Database(format!("Malformed document: {}", e)))
}
