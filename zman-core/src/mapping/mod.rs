//! Event mappings
//!
//! An event mapping links one calendar event name pattern to one tag. The
//! mapping table is the only place where knowledge of specific calendar event
//! names lives; adding a holiday is a data change, never a code change.

mod matcher;

pub use matcher::{match_tags, CompiledMapping, MappingTable, TagMatch, WildcardPattern};

use serde::{Deserialize, Serialize};

/// Default priority for mappings that don't declare one
pub const DEFAULT_PRIORITY: i32 = 100;

/// How a mapping's pattern is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Byte-for-byte, case-sensitive equality
    Exact,
    /// Literal text with a single `%` wildcard (prefix, suffix, infix) or the
    /// `%text%` contains form
    Wildcard,
    /// Regular expression matched against the whole event name
    Regex,
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchKind::Exact => write!(f, "exact"),
            MatchKind::Wildcard => write!(f, "wildcard"),
            MatchKind::Regex => write!(f, "regex"),
        }
    }
}

/// A rule associating a calendar event name pattern with a tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMapping {
    /// Tag the event resolves to
    pub tag_key: String,

    /// Pattern, interpreted per `match_kind`
    pub pattern: String,

    /// Explicit match kind; inferred from the pattern when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_kind: Option<MatchKind>,

    /// Lower value = more specific, evaluated first
    #[serde(default = "default_priority")]
    pub priority: i32,
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

impl EventMapping {
    /// Create a mapping with an inferred match kind
    pub fn new(tag_key: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            tag_key: tag_key.into(),
            pattern: pattern.into(),
            match_kind: None,
            priority: DEFAULT_PRIORITY,
        }
    }

    pub fn exact(tag_key: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(tag_key, pattern).with_kind(MatchKind::Exact)
    }

    pub fn wildcard(tag_key: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(tag_key, pattern).with_kind(MatchKind::Wildcard)
    }

    pub fn regex(tag_key: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(tag_key, pattern).with_kind(MatchKind::Regex)
    }

    /// Set the match kind
    pub fn with_kind(mut self, kind: MatchKind) -> Self {
        self.match_kind = Some(kind);
        self
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// The match kind in effect: the declared one, otherwise `wildcard` when
    /// the pattern contains `%` and `exact` when it doesn't
    pub fn effective_kind(&self) -> MatchKind {
        self.match_kind.unwrap_or(if self.pattern.contains('%') {
            MatchKind::Wildcard
        } else {
            MatchKind::Exact
        })
    }
}
