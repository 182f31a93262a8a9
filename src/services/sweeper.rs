// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Optional background expiry.
//!
//! Reads already evict lazily; the sweeper only keeps the store from
//! accumulating records nobody looks at again.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::services::auth::OidcAuth;
use crate::services::events::EventRepository;
use crate::services::session::SessionManager;

/// Counts from one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub sessions: usize,
    pub pending_logins: usize,
    pub events: usize,
}

#[derive(Clone)]
pub struct Sweeper {
    sessions: SessionManager,
    events: EventRepository,
    oidc: Option<OidcAuth>,
}

impl Sweeper {
    pub fn new(sessions: SessionManager, events: EventRepository, oidc: Option<OidcAuth>) -> Self {
        Self {
            sessions,
            events,
            oidc,
        }
    }

    /// Run every sweep once. A failing step is logged and does not stop the others.
    pub async fn sweep_once(&self) -> SweepReport {
        let mut report = SweepReport::default();

        match self.sessions.sweep_expired().await {
            Ok(count) => report.sessions = count,
            Err(e) => tracing::error!(error = %e, "Session sweep failed"),
        }

        if let Some(oidc) = &self.oidc {
            match oidc.sweep_expired().await {
                Ok(count) => report.pending_logins = count,
                Err(e) => tracing::error!(error = %e, "Pending login sweep failed"),
            }
        }

        match self.events.sweep_expired().await {
            Ok(count) => report.events = count,
            Err(e) => tracing::error!(error = %e, "Event sweep failed"),
        }

        report
    }

    /// Sweep on a fixed period until the runtime shuts down.
    pub fn spawn(self, period: Duration) -> JoinHandle<()> {
        tracing::info!(period_secs = period.as_secs(), "Starting expiry sweeper");

        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let report = self.sweep_once().await;
                if report != SweepReport::default() {
                    tracing::info!(
                        sessions = report.sessions,
                        pending_logins = report.pending_logins,
                        events = report.events,
                        "Expired records swept"
                    );
                }
            }
        })
    }
}
