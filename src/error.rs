// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::services::recurrence::RecurrenceError;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Session expired.")]
    Unauthenticated,

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("User is already exist!")]
    AlreadyExists,

    #[error("User name or Password is not correct!")]
    InvalidCredentials,

    #[error(transparent)]
    Date(#[from] RecurrenceError),

    #[error("Login state does not match")]
    InvalidState,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Identity provider error: {0}")]
    IdentityProvider(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    /// HTTP status this error is surfaced as.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated | AppError::InvalidState => StatusCode::UNAUTHORIZED,
            AppError::Validation(_)
            | AppError::AlreadyExists
            | AppError::InvalidCredentials
            | AppError::Date(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::IdentityProvider(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, details) = match &self {
            AppError::Unauthenticated => ("unauthenticated", Some(self.to_string())),
            AppError::Validation(msg) => ("validation_error", Some(msg.clone())),
            AppError::AlreadyExists => ("already_exists", Some(self.to_string())),
            AppError::InvalidCredentials => ("invalid_credentials", Some(self.to_string())),
            AppError::Date(RecurrenceError::InvalidFormat) => {
                ("invalid_format", Some(self.to_string()))
            }
            AppError::Date(RecurrenceError::DateNotFound) => {
                ("date_not_found", Some(self.to_string()))
            }
            AppError::InvalidState => ("invalid_state", None),
            AppError::NotFound(msg) => ("not_found", Some(msg.clone())),
            AppError::IdentityProvider(msg) => {
                tracing::warn!(error = %msg, "Identity provider error");
                ("identity_provider_error", None)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                ("database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                ("internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
