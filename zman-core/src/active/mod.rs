//! Active-Tag-Set
//!
//! The set of tag keys in effect for one date and location, plus the
//! bookkeeping of where each key came from. Built by
//! [`ActiveTagSetBuilder`]; consumed by the visibility filter.

mod builder;

pub use builder::{build_active_tag_set, ActiveTagSetBuilder, BuilderConfig, DayEvents};

use std::collections::{btree_set, BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Prefixes used for day-relative tag keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayMarkers {
    pub erev_prefix: String,
    pub motzei_prefix: String,
}

impl DayMarkers {
    pub fn new(erev_prefix: impl Into<String>, motzei_prefix: impl Into<String>) -> Self {
        Self {
            erev_prefix: erev_prefix.into(),
            motzei_prefix: motzei_prefix.into(),
        }
    }

    /// `erev_<tag>`
    pub fn erev(&self, tag_key: &str) -> String {
        format!("{}{}", self.erev_prefix, tag_key)
    }

    /// `motzei_<tag>`
    pub fn motzei(&self, tag_key: &str) -> String {
        format!("{}{}", self.motzei_prefix, tag_key)
    }
}

impl Default for DayMarkers {
    fn default() -> Self {
        Self::new("erev_", "motzei_")
    }
}

/// Deduplicated, ordered set of active tag keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActiveTagSet(BTreeSet<String>);

impl ActiveTagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, tag_key: &str) -> bool {
        self.0.contains(tag_key)
    }

    /// Add a key; returns false if it was already present
    pub fn insert(&mut self, tag_key: impl Into<String>) -> bool {
        self.0.insert(tag_key.into())
    }

    pub fn iter(&self) -> btree_set::Iter<'_, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> BTreeSet<String> {
        self.0
    }
}

impl<S: Into<String>> Extend<S> for ActiveTagSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

impl<S: Into<String>> FromIterator<S> for ActiveTagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<'a> IntoIterator for &'a ActiveTagSet {
    type Item = &'a String;
    type IntoIter = btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for ActiveTagSet {
    type Item = String;
    type IntoIter = btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Why a tag is active
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "from")]
pub enum TagSource {
    /// Matched from one of today's calendar event names
    Event(String),
    /// Friday / Saturday tags
    DayOfWeek,
    /// Tomorrow resolves to this full-restriction tag
    Erev(String),
    /// Yesterday resolved to this full-restriction tag
    Motzei(String),
}

/// Which calendar fetch a degradation refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayOffset {
    Yesterday,
    Today,
    Tomorrow,
}

impl fmt::Display for DayOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayOffset::Yesterday => write!(f, "yesterday"),
            DayOffset::Today => write!(f, "today"),
            DayOffset::Tomorrow => write!(f, "tomorrow"),
        }
    }
}

/// A calendar fetch that failed or timed out and contributed no tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedFetch {
    pub offset: DayOffset,
    pub date: NaiveDate,
    /// Stable error code of the underlying failure
    pub code: String,
    pub reason: String,
}

impl fmt::Display for DegradedFetch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) [{}]: {}", self.offset, self.date, self.code, self.reason)
    }
}

/// Active-Tag-Set for a date, with provenance and degradation report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTagResolution {
    pub date: NaiveDate,
    pub tags: ActiveTagSet,
    pub sources: BTreeMap<String, Vec<TagSource>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<DegradedFetch>,
}

impl ActiveTagResolution {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            tags: ActiveTagSet::new(),
            sources: BTreeMap::new(),
            degraded: Vec::new(),
        }
    }

    /// Whether any fetch failed; the set may be missing event-derived tags
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }

    /// Sources recorded for a tag
    pub fn sources_of(&self, tag_key: &str) -> &[TagSource] {
        self.sources.get(tag_key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn record(&mut self, tag_key: String, source: TagSource) {
        let sources = self.sources.entry(tag_key.clone()).or_default();
        if !sources.contains(&source) {
            sources.push(source);
        }
        self.tags.insert(tag_key);
    }
}
