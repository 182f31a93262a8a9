// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event Reminder API Server
//!
//! Serves the reminder JSON API: accounts, sessions and per-user events
//! with countdowns to their next occurrence.

use event_reminder::{
    config::{Config, StoreBackend},
    db::{DocumentStore, FirestoreDb, MemoryStore},
    services::{GoogleIdentityProvider, IdentityProvider},
    time_utils::SystemClock,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Event Reminder API");

    let store: Arc<dyn DocumentStore> = match config.store_backend {
        StoreBackend::Firestore => {
            let db = FirestoreDb::new(&config.gcp_project_id).await?;
            tracing::info!(project = %config.gcp_project_id, "Using Firestore store");
            Arc::new(db)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let provider: Option<Arc<dyn IdentityProvider>> = match config.google {
        Some(_) => Some(Arc::new(GoogleIdentityProvider::new(&config)?)),
        None => {
            tracing::info!("Google credentials not set; Google sign-in disabled");
            None
        }
    };

    // Build shared state
    let state = Arc::new(AppState::new(
        config.clone(),
        store,
        Arc::new(SystemClock),
        provider,
    )?);

    if let Some(period) = config.sweep_interval {
        state.sweeper().spawn(period);
    }

    // Build router
    let app = event_reminder::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("event_reminder=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
