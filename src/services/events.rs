// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Owner-scoped event storage with lazy eviction of past events.

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;

use crate::db::{collections, DocumentStore, EntityId, Filter, Key};
use crate::error::AppError;
use crate::models::{from_fields, to_fields, Event, EventView};
use crate::time_utils::{start_of_day, Clock};

const SECONDS_PER_DAY: i64 = 86_400;

/// Human-readable countdown for `seconds` remaining.
///
/// Under a day: `H:MM:SS left.`; otherwise whole days, `N days later.`
pub fn format_eta(seconds: i64) -> String {
    if seconds < SECONDS_PER_DAY {
        let secs = seconds % 60;
        let minutes = seconds / 60;
        let mins = minutes % 60;
        let hours = minutes / 60;
        format!("{}:{:02}:{:02} left.", hours, mins, secs)
    } else {
        format!("{} days later.", seconds / SECONDS_PER_DAY)
    }
}

/// Build the API view of a (future) event.
pub fn event_view(event: &Event, now: DateTime<Utc>) -> EventView {
    let remaining = (start_of_day(event.date) - now).num_seconds();
    EventView {
        id: event.id,
        name: event.name.clone(),
        date: event.date.format("%m/%d/%Y").to_string(),
        eta: format_eta(remaining),
    }
}

/// Event storage scoped under each user.
#[derive(Clone)]
pub struct EventRepository {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl EventRepository {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Store a new event under `owner_id` and return its ID.
    pub async fn add(
        &self,
        owner_id: EntityId,
        name: &str,
        date: NaiveDate,
    ) -> Result<EntityId, AppError> {
        let event = Event::new(owner_id, name, date)?;
        let id = self
            .store
            .put(
                collections::EVENTS,
                Some(Key::user(owner_id)),
                None,
                to_fields(&event)?,
            )
            .await?;

        tracing::info!(owner_id, event_id = id, date = %date, "Event added");
        Ok(id)
    }

    /// Upcoming events of `owner_id`, soonest first, with ETA strings.
    ///
    /// Events at or before now are deleted as a side effect.
    pub async fn list(&self, owner_id: EntityId) -> Result<Vec<EventView>, AppError> {
        let now = self.clock.now();
        let parent = Key::user(owner_id);
        let docs = self
            .store
            .query(collections::EVENTS, Some(parent), &[])
            .await?;

        let mut upcoming = Vec::with_capacity(docs.len());
        let mut evicted = 0usize;
        for (id, fields) in docs {
            let mut event: Event = from_fields(fields)?;
            event.id = id;
            if start_of_day(event.date) <= now {
                self.store
                    .delete(collections::EVENTS, id, Some(parent))
                    .await?;
                evicted += 1;
                continue;
            }
            upcoming.push(event);
        }

        if evicted > 0 {
            tracing::debug!(owner_id, evicted, "Evicted past events");
        }

        upcoming.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        Ok(upcoming.iter().map(|event| event_view(event, now)).collect())
    }

    /// Delete one event of `owner_id`.
    ///
    /// Events are keyed under their owner, so an ID belonging to someone
    /// else is indistinguishable from a missing one: both are `NotFound`.
    pub async fn remove(&self, owner_id: EntityId, event_id: EntityId) -> Result<(), AppError> {
        let parent = Key::user(owner_id);
        if self
            .store
            .get(collections::EVENTS, event_id, Some(parent))
            .await?
            .is_none()
        {
            return Err(AppError::NotFound(format!("Event {} not found", event_id)));
        }

        self.store
            .delete(collections::EVENTS, event_id, Some(parent))
            .await?;
        tracing::info!(owner_id, event_id, "Event deleted");
        Ok(())
    }

    /// Delete every event of one user.
    pub async fn remove_all_for(&self, owner_id: EntityId) -> Result<usize, AppError> {
        let parent = Key::user(owner_id);
        let events = self
            .store
            .query(collections::EVENTS, Some(parent), &[])
            .await?;

        let count = events.len();
        for (id, _) in events {
            self.store.delete(collections::EVENTS, id, Some(parent)).await?;
        }
        Ok(count)
    }

    /// Delete every past event across all users.
    pub async fn sweep_expired(&self) -> Result<usize, AppError> {
        let now = self.clock.now();
        // An event dated today has already started at midnight.
        let today = now.date_naive().format("%Y-%m-%d").to_string();
        let expired = self
            .store
            .query(collections::EVENTS, None, &[Filter::le("date", today)])
            .await?;

        let mut count = 0;
        for (id, fields) in expired {
            let event: Event = from_fields(fields)?;
            if start_of_day(event.date) <= now {
                self.store
                    .delete(collections::EVENTS, id, Some(Key::user(event.owner_id)))
                    .await?;
                count += 1;
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::time_utils::FixedClock;
    use chrono::{Duration, TimeZone};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup(now: DateTime<Utc>) -> (EventRepository, Arc<MemoryStore>, Arc<FixedClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::new(now));
        (
            EventRepository::new(store.clone(), clock.clone()),
            store,
            clock,
        )
    }

    #[test]
    fn eta_under_a_day() {
        assert_eq!(format_eta(0), "0:00:00 left.");
        assert_eq!(format_eta(59), "0:00:59 left.");
        assert_eq!(format_eta(3 * 3600 + 4 * 60 + 5), "3:04:05 left.");
        assert_eq!(format_eta(86_399), "23:59:59 left.");
    }

    #[test]
    fn eta_days() {
        assert_eq!(format_eta(86_400), "1 days later.");
        assert_eq!(format_eta(2 * 86_400 - 1), "1 days later.");
        assert_eq!(format_eta(166 * 86_400), "166 days later.");
    }

    #[tokio::test]
    async fn birthday_scenario() {
        let (repo, _, _) = setup(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let id = repo.add(1, "Birthday", date(2024, 6, 15)).await.unwrap();

        let events = repo.list(1).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, id);
        assert_eq!(events[0].name, "Birthday");
        assert_eq!(events[0].date, "06/15/2024");
        assert_eq!(events[0].eta, "166 days later.");
    }

    #[tokio::test]
    async fn list_sorts_by_date_regardless_of_insert_order() {
        let (repo, _, _) = setup(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        for (name, d) in [
            ("c", date(2024, 12, 25)),
            ("a", date(2024, 2, 1)),
            ("b", date(2024, 7, 4)),
            ("a2", date(2024, 2, 1)),
        ] {
            repo.add(1, name, d).await.unwrap();
        }

        let events = repo.list(1).await.unwrap();
        let dates: Vec<&str> = events.iter().map(|e| e.date.as_str()).collect();
        assert_eq!(
            dates,
            vec!["02/01/2024", "02/01/2024", "07/04/2024", "12/25/2024"]
        );
    }

    #[tokio::test]
    async fn list_evicts_past_and_current_events() {
        let (repo, store, clock) = setup(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        repo.add(1, "past", date(2024, 2, 1)).await.unwrap();
        repo.add(1, "now", date(2024, 3, 1)).await.unwrap();
        repo.add(1, "future", date(2024, 3, 2)).await.unwrap();

        let events = repo.list(1).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "future");
        assert_eq!(events[0].eta, "1 days later.");
        assert_eq!(store.count(collections::EVENTS), 1);

        clock.advance(Duration::hours(20));
        let events = repo.list(1).await.unwrap();
        assert_eq!(events[0].eta, "4:00:00 left.");
    }

    #[tokio::test]
    async fn list_is_scoped_to_owner() {
        let (repo, _, _) = setup(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        repo.add(1, "mine", date(2024, 5, 1)).await.unwrap();
        repo.add(2, "theirs", date(2024, 5, 1)).await.unwrap();

        let events = repo.list(1).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "mine");
    }

    #[tokio::test]
    async fn remove_own_and_foreign_event() {
        let (repo, _, _) = setup(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let mine = repo.add(1, "mine", date(2024, 5, 1)).await.unwrap();
        let theirs = repo.add(2, "theirs", date(2024, 5, 1)).await.unwrap();

        assert!(matches!(
            repo.remove(1, theirs).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(repo.list(2).await.unwrap().len(), 1);

        repo.remove(1, mine).await.unwrap();
        assert!(repo.list(1).await.unwrap().is_empty());
        assert!(matches!(repo.remove(1, mine).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn add_rejects_empty_name() {
        let (repo, _, _) = setup(Utc::now());
        assert!(matches!(
            repo.add(1, " ", date(2030, 1, 1)).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn sweep_removes_past_events_for_all_users() {
        let (repo, store, _) = setup(Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap());
        repo.add(1, "past", date(2024, 2, 1)).await.unwrap();
        repo.add(2, "today", date(2024, 3, 1)).await.unwrap();
        repo.add(2, "future", date(2024, 3, 2)).await.unwrap();

        assert_eq!(repo.sweep_expired().await.unwrap(), 2);
        assert_eq!(store.count(collections::EVENTS), 1);
    }

    #[tokio::test]
    async fn remove_all_for_user() {
        let (repo, store, _) = setup(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        repo.add(1, "a", date(2024, 5, 1)).await.unwrap();
        repo.add(1, "b", date(2024, 6, 1)).await.unwrap();
        repo.add(2, "c", date(2024, 6, 1)).await.unwrap();

        assert_eq!(repo.remove_all_for(1).await.unwrap(), 2);
        assert_eq!(store.count(collections::EVENTS), 1);
    }
}
