//! Active-Tag-Set builder
//!
//! Resolution for a date runs in two phases:
//! - fetch: today's, tomorrow's and yesterday's event names, concurrently,
//!   each bounded by the fetch timeout
//! - resolve: pattern-match the fetched names, add day-of-week tags, derive
//!   erev/motzei tags from the adjacent days' full-restriction tags
//!
//! A fetch that fails or times out degrades to "no events" for that day and
//! is reported in [`ActiveTagResolution::degraded`]; it never fails the build.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{Datelike, NaiveDate, Weekday};

use super::{ActiveTagResolution, ActiveTagSet, DayMarkers, DayOffset, DegradedFetch, TagSource};
use crate::calendar::{CalendarProvider, Location};
use crate::config::TagConfig;
use crate::error::ZmanError;

const SHABBOS: &str = "shabbos";

/// Builder settings
#[derive(Debug, Clone, PartialEq)]
pub struct BuilderConfig {
    /// Upper bound on each calendar fetch
    pub fetch_timeout: Duration,
    pub erev_prefix: String,
    pub motzei_prefix: String,
    /// Only derive `erev_<tag>` / `motzei_<tag>` when the tag is not also
    /// active today
    pub suppress_within_observance: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        let markers = DayMarkers::default();
        Self {
            fetch_timeout: Duration::from_secs(5),
            erev_prefix: markers.erev_prefix,
            motzei_prefix: markers.motzei_prefix,
            suppress_within_observance: false,
        }
    }
}

impl BuilderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_erev_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.erev_prefix = prefix.into();
        self
    }

    pub fn with_motzei_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.motzei_prefix = prefix.into();
        self
    }

    pub fn with_suppress_within_observance(mut self, suppress: bool) -> Self {
        self.suppress_within_observance = suppress;
        self
    }

    /// Prefixes as [`DayMarkers`]
    pub fn markers(&self) -> DayMarkers {
        DayMarkers::new(self.erev_prefix.clone(), self.motzei_prefix.clone())
    }
}

/// Event names for a date and its neighbours
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayEvents {
    pub today: Vec<String>,
    pub tomorrow: Vec<String>,
    pub yesterday: Vec<String>,
}

impl DayEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_today<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.today = events.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tomorrow<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tomorrow = events.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_yesterday<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.yesterday = events.into_iter().map(Into::into).collect();
        self
    }
}

/// Builds Active-Tag-Sets against one configuration snapshot
#[derive(Debug, Clone)]
pub struct ActiveTagSetBuilder<'a> {
    tag_config: &'a TagConfig,
    settings: BuilderConfig,
    markers: DayMarkers,
}

impl<'a> ActiveTagSetBuilder<'a> {
    pub fn new(tag_config: &'a TagConfig) -> Self {
        Self::with_settings(tag_config, BuilderConfig::default())
    }

    pub fn with_settings(tag_config: &'a TagConfig, settings: BuilderConfig) -> Self {
        let markers = settings.markers();
        Self {
            tag_config,
            settings,
            markers,
        }
    }

    pub fn settings(&self) -> &BuilderConfig {
        &self.settings
    }

    /// Active tag keys for `date`
    pub async fn build<C>(&self, date: NaiveDate, location: &Location, calendar: &C) -> ActiveTagSet
    where
        C: CalendarProvider + ?Sized,
    {
        self.build_detailed(date, location, calendar).await.tags
    }

    /// Active tag keys for `date`, with provenance and any degraded fetches
    #[tracing::instrument(skip_all, fields(date = %date, provider = calendar.name()))]
    pub async fn build_detailed<C>(
        &self,
        date: NaiveDate,
        location: &Location,
        calendar: &C,
    ) -> ActiveTagResolution
    where
        C: CalendarProvider + ?Sized,
    {
        // Adjacent days only matter when something can produce erev/motzei
        let needs_neighbours = self
            .tag_config
            .catalog()
            .iter()
            .any(|tag| tag.is_full_restriction);
        let (tomorrow, yesterday) = if needs_neighbours {
            (date.succ_opt(), date.pred_opt())
        } else {
            (None, None)
        };

        let (today_events, tomorrow_events, yesterday_events) = tokio::join!(
            self.fetch(calendar, Some(date), location, DayOffset::Today),
            self.fetch(calendar, tomorrow, location, DayOffset::Tomorrow),
            self.fetch(calendar, yesterday, location, DayOffset::Yesterday),
        );

        let mut degraded = Vec::new();
        let mut events = DayEvents::new();
        for (slot, fetched) in [
            (&mut events.today, today_events),
            (&mut events.tomorrow, tomorrow_events),
            (&mut events.yesterday, yesterday_events),
        ] {
            match fetched {
                Ok(names) => *slot = names,
                Err(failure) => degraded.push(failure),
            }
        }

        let mut resolution = self.resolve(date, calendar.day_of_week(date), &events);
        resolution.degraded = degraded;

        tracing::debug!(
            tags = resolution.tags.len(),
            degraded = resolution.degraded.len(),
            "resolved active tag set"
        );

        resolution
    }

    /// Resolve already-fetched event names, without any I/O
    ///
    /// The day of week is derived from `date`.
    pub fn resolve_days(&self, date: NaiveDate, events: &DayEvents) -> ActiveTagResolution {
        self.resolve(date, date.weekday(), events)
    }

    fn resolve(
        &self,
        date: NaiveDate,
        weekday: Weekday,
        events: &DayEvents,
    ) -> ActiveTagResolution {
        let mappings = self.tag_config.mappings();
        let mut resolution = ActiveTagResolution::new(date);

        for name in &events.today {
            let matched = mappings.match_tags(name);
            if !matched.is_empty() {
                tracing::debug!(event = %name, tags = ?matched, "event matched");
            }
            for tag in matched {
                resolution.record(tag, TagSource::Event(name.clone()));
            }
        }

        match weekday {
            Weekday::Fri => resolution.record(self.markers.erev(SHABBOS), TagSource::DayOfWeek),
            Weekday::Sat => {
                resolution.record(SHABBOS.to_string(), TagSource::DayOfWeek);
                resolution.record(self.markers.motzei(SHABBOS), TagSource::DayOfWeek);
            }
            _ => {}
        }

        // Snapshot of today's own tags for the suppression check
        let today: BTreeSet<String> = resolution.tags.iter().cloned().collect();

        for tag in self.full_restriction_tags(&events.tomorrow) {
            if self.settings.suppress_within_observance && today.contains(&tag) {
                continue;
            }
            resolution.record(self.markers.erev(&tag), TagSource::Erev(tag));
        }

        for tag in self.full_restriction_tags(&events.yesterday) {
            if self.settings.suppress_within_observance && today.contains(&tag) {
                continue;
            }
            resolution.record(self.markers.motzei(&tag), TagSource::Motzei(tag));
        }

        resolution
    }

    fn full_restriction_tags(&self, events: &[String]) -> BTreeSet<String> {
        let catalog = self.tag_config.catalog();
        events
            .iter()
            .flat_map(|name| self.tag_config.mappings().match_tags(name))
            .filter(|tag| catalog.is_full_restriction(tag))
            .collect()
    }

    async fn fetch<C>(
        &self,
        calendar: &C,
        date: Option<NaiveDate>,
        location: &Location,
        offset: DayOffset,
    ) -> std::result::Result<Vec<String>, DegradedFetch>
    where
        C: CalendarProvider + ?Sized,
    {
        let Some(date) = date else {
            return Ok(Vec::new());
        };

        let outcome = tokio::time::timeout(
            self.settings.fetch_timeout,
            calendar.events_for_date(date, location),
        )
        .await;

        let error = match outcome {
            Ok(Ok(events)) => return Ok(events),
            Ok(Err(error)) => error,
            Err(_) => ZmanError::CalendarTimeout {
                date: date.to_string(),
                timeout_ms: u64::try_from(self.settings.fetch_timeout.as_millis())
                    .unwrap_or(u64::MAX),
            },
        };

        tracing::warn!(
            %date,
            %offset,
            provider = calendar.name(),
            code = error.error_code(),
            "calendar fetch degraded: {}",
            error
        );

        Err(DegradedFetch {
            offset,
            date,
            code: error.error_code().to_string(),
            reason: error.to_string(),
        })
    }
}

/// Active tag keys for `date` with default builder settings
pub async fn build_active_tag_set<C>(
    date: NaiveDate,
    location: &Location,
    calendar: &C,
    tag_config: &TagConfig,
) -> ActiveTagSet
where
    C: CalendarProvider + ?Sized,
{
    ActiveTagSetBuilder::new(tag_config)
        .build(date, location, calendar)
        .await
}
