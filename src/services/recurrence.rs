// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Resolution of user-entered event dates.
//!
//! Accepted inputs:
//! - `MM/DD` resolves to the next occurrence strictly after now
//! - `YYYY/MM/DD` and `MM/DD/YYYY` are taken literally
//!
//! Everything here is pure given `now`.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::time_utils::start_of_day;

/// How many candidate years (starting with the current one) are searched.
pub const SEARCH_YEARS: i32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RecurrenceError {
    #[error("Date format is wrong!")]
    InvalidFormat,

    #[error("Date does not exist!")]
    DateNotFound,
}

/// Resolve a `/`-separated date string into a calendar date.
pub fn resolve_date(input: &str, now: DateTime<Utc>) -> Result<NaiveDate, RecurrenceError> {
    let raw: Vec<&str> = input.trim().split('/').map(str::trim).collect();
    let parts = raw
        .iter()
        .map(|part| part.parse::<u32>())
        .collect::<Result<Vec<u32>, _>>()
        .map_err(|_| RecurrenceError::InvalidFormat)?;

    match parts.as_slice() {
        [month, day] => next_occurrence(*month, *day, now),
        [first, second, third] => {
            let (year, month, day) = if raw[0].len() == 4 {
                (*first, *second, *third)
            } else {
                (*third, *first, *second)
            };
            let year = i32::try_from(year).map_err(|_| RecurrenceError::InvalidFormat)?;
            NaiveDate::from_ymd_opt(year, month, day).ok_or(RecurrenceError::InvalidFormat)
        }
        _ => Err(RecurrenceError::InvalidFormat),
    }
}

/// Earliest `month/day` whose midnight (UTC) is strictly after `now`,
/// searching [`SEARCH_YEARS`] years from the current one. Years where the
/// date does not exist (Feb 29) are skipped.
pub fn next_occurrence(
    month: u32,
    day: u32,
    now: DateTime<Utc>,
) -> Result<NaiveDate, RecurrenceError> {
    let year = now.year();
    (year..year + SEARCH_YEARS)
        .filter_map(|year| NaiveDate::from_ymd_opt(year, month, day))
        .find(|date| start_of_day(*date) > now)
        .ok_or(RecurrenceError::DateNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn birthday_later_this_year() {
        assert_eq!(resolve_date("06/15", at(2024, 1, 1)), Ok(date(2024, 6, 15)));
    }

    #[test]
    fn passed_date_rolls_to_next_year() {
        assert_eq!(resolve_date("01/01", at(2024, 6, 1)), Ok(date(2025, 1, 1)));
    }

    #[test]
    fn today_is_not_in_the_future() {
        // Midnight today equals now, and one second past midnight is after it.
        assert_eq!(resolve_date("06/15", at(2024, 6, 15)), Ok(date(2025, 6, 15)));
        let just_after = at(2024, 6, 15) + Duration::seconds(1);
        assert_eq!(resolve_date("06/15", just_after), Ok(date(2025, 6, 15)));
        let just_before = at(2024, 6, 15) - Duration::seconds(1);
        assert_eq!(resolve_date("06/15", just_before), Ok(date(2024, 6, 15)));
    }

    #[test]
    fn leap_day_skips_to_next_leap_year() {
        assert_eq!(resolve_date("02/29", at(2025, 3, 1)), Ok(date(2028, 2, 29)));
        assert_eq!(resolve_date("2/29", at(2024, 1, 1)), Ok(date(2024, 2, 29)));
    }

    #[test]
    fn impossible_partial_dates_are_not_found() {
        assert_eq!(
            resolve_date("02/30", at(2024, 1, 1)),
            Err(RecurrenceError::DateNotFound)
        );
        assert_eq!(
            resolve_date("13/01", at(2024, 1, 1)),
            Err(RecurrenceError::DateNotFound)
        );
        assert_eq!(
            resolve_date("00/10", at(2024, 1, 1)),
            Err(RecurrenceError::DateNotFound)
        );
    }

    #[test]
    fn full_dates_in_either_order() {
        assert_eq!(resolve_date("2025/06/15", at(2024, 1, 1)), Ok(date(2025, 6, 15)));
        assert_eq!(resolve_date("06/15/2025", at(2024, 1, 1)), Ok(date(2025, 6, 15)));
        // Taken literally even when already past
        assert_eq!(resolve_date("2020/01/02", at(2024, 1, 1)), Ok(date(2020, 1, 2)));
    }

    #[test]
    fn invalid_full_dates() {
        assert_eq!(
            resolve_date("2023/02/29", at(2024, 1, 1)),
            Err(RecurrenceError::InvalidFormat)
        );
        assert_eq!(
            resolve_date("13/01/2025", at(2024, 1, 1)),
            Err(RecurrenceError::InvalidFormat)
        );
    }

    #[test]
    fn malformed_inputs() {
        let now = at(2024, 1, 1);
        for input in ["", "06", "06/15/2024/1", "June/15", "06/xx", "06/-1", "06//15"] {
            assert_eq!(
                resolve_date(input, now),
                Err(RecurrenceError::InvalidFormat),
                "input {input:?}"
            );
        }
    }

    #[test]
    fn every_valid_day_resolves_to_earliest_future_occurrence() {
        let now = at(2023, 7, 4) + Duration::hours(13);
        let mut day = date(2024, 1, 1);
        while day.year() == 2024 {
            let resolved = next_occurrence(day.month(), day.day(), now).unwrap();
            assert!(start_of_day(resolved) > now);

            // No earlier valid candidate year is still in the future
            for year in now.year()..resolved.year() {
                if let Some(earlier) = NaiveDate::from_ymd_opt(year, day.month(), day.day()) {
                    assert!(start_of_day(earlier) <= now);
                }
            }
            day += Duration::days(1);
        }
    }
}
