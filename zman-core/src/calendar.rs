//! Calendar collaborator
//!
//! The engine never computes Hebrew-calendar data itself. A
//! [`CalendarProvider`] supplies, for a date and location, the list of event
//! names exactly as the upstream calendar emits them (punctuation included).

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Weekday};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ZmanError};

/// Geographic location passed through to the calendar provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// IANA timezone name
    pub timezone: String,
    /// Israel observes one-day festivals; providers use this to pick the
    /// right event list
    #[serde(default)]
    pub is_israel: bool,
}

impl Location {
    /// Create a location, deriving `is_israel` from the coordinates
    pub fn new(latitude: f64, longitude: f64, timezone: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            timezone: timezone.into(),
            is_israel: Self::is_in_israel(latitude, longitude),
        }
    }

    /// Approximate bounding box check for Israel
    pub fn is_in_israel(latitude: f64, longitude: f64) -> bool {
        (29.5..=33.5).contains(&latitude) && (34.0..=36.0).contains(&longitude)
    }
}

/// Source of calendar events
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Event names active on `date` at `location`
    async fn events_for_date(&self, date: NaiveDate, location: &Location) -> Result<Vec<String>>;

    /// Day of week for `date`; derived locally by default
    fn day_of_week(&self, date: NaiveDate) -> Weekday {
        date.weekday()
    }

    /// Provider name (for logging)
    fn name(&self) -> &str;
}

/// In-memory calendar provider
///
/// Serves fixed event lists per date. Supports failure injection and an
/// artificial delay so degradation and timeout paths can be exercised.
#[derive(Debug, Default)]
pub struct StaticCalendar {
    events: RwLock<HashMap<NaiveDate, Vec<String>>>,
    failing: RwLock<HashSet<NaiveDate>>,
    delay: RwLock<Option<Duration>>,
    fetches: AtomicU64,
}

impl StaticCalendar {
    /// Create an empty calendar
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the events for a date
    pub fn with_events<I, S>(self, date: NaiveDate, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_events(date, events);
        self
    }

    /// Builder: make fetches for a date fail
    pub fn with_failure(self, date: NaiveDate) -> Self {
        self.fail_on(date);
        self
    }

    /// Builder: delay every fetch
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.write() = Some(delay);
        self
    }

    /// Replace the events for a date
    pub fn set_events<I, S>(&self, date: NaiveDate, events: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.events
            .write()
            .insert(date, events.into_iter().map(Into::into).collect());
    }

    /// Make fetches for a date fail
    pub fn fail_on(&self, date: NaiveDate) {
        self.failing.write().insert(date);
    }

    /// Stop failing fetches for a date
    pub fn recover(&self, date: NaiveDate) {
        self.failing.write().remove(&date);
    }

    /// Number of fetches served (including failed ones)
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CalendarProvider for StaticCalendar {
    async fn events_for_date(&self, date: NaiveDate, _location: &Location) -> Result<Vec<String>> {
        self.fetches.fetch_add(1, Ordering::Relaxed);

        let delay = *self.delay.read();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.read().contains(&date) {
            return Err(ZmanError::CalendarUnavailable {
                date: date.to_string(),
                reason: "injected failure".to_string(),
            });
        }

        Ok(self.events.read().get(&date).cloned().unwrap_or_default())
    }

    fn name(&self) -> &str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_israel_detection() {
        let jerusalem = Location::new(31.7683, 35.2137, "Asia/Jerusalem");
        assert!(jerusalem.is_israel);

        let new_york = Location::new(40.7128, -74.0060, "America/New_York");
        assert!(!new_york.is_israel);
    }

    #[test]
    fn test_day_of_week_default() {
        let calendar = StaticCalendar::new();
        // 2025-10-03 is a Friday
        assert_eq!(calendar.day_of_week(date(2025, 10, 3)), Weekday::Fri);
        assert_eq!(calendar.day_of_week(date(2025, 10, 4)), Weekday::Sat);
    }

    #[tokio::test]
    async fn test_static_events_and_failures() {
        let location = Location::new(40.7128, -74.0060, "America/New_York");
        let calendar = StaticCalendar::new()
            .with_events(date(2025, 10, 2), ["Yom Kippur"])
            .with_failure(date(2025, 10, 3));

        let events = calendar.events_for_date(date(2025, 10, 2), &location).await.unwrap();
        assert_eq!(events, vec!["Yom Kippur".to_string()]);

        let empty = calendar.events_for_date(date(2025, 10, 1), &location).await.unwrap();
        assert!(empty.is_empty());

        let failed = calendar.events_for_date(date(2025, 10, 3), &location).await;
        assert!(matches!(failed, Err(ZmanError::CalendarUnavailable { .. })));

        calendar.recover(date(2025, 10, 3));
        assert!(calendar.events_for_date(date(2025, 10, 3), &location).await.is_ok());
        assert_eq!(calendar.fetch_count(), 4);
    }
}
