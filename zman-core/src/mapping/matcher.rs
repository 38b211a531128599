//! Pattern matcher - resolves a calendar event name to tags
//!
//! Matching is per mapping, not globally exclusive:
//! - Every mapping that matches contributes its tag, so one event name can
//!   resolve to a specific tag and a generic one at the same time
//! - When several mappings for the *same* tag match, only the most specific
//!   one (lowest priority, then exact before wildcard before regex, then load
//!   order) is reported for that tag
//!
//! An empty result is the normal outcome for events with no filtering
//! significance.

use std::collections::BTreeSet;

use regex::Regex;

use super::{EventMapping, MatchKind};
use crate::error::{Result, ZmanError};

/// Single-wildcard pattern
///
/// Supported forms:
/// - `Text` (no wildcard): literal equality
/// - `Text%`: prefix
/// - `%Text`: suffix
/// - `Pre%Post`: prefix and suffix
/// - `%Text%`: contains
/// - `%`: any name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WildcardPattern {
    Literal(String),
    Affix { prefix: String, suffix: String },
    Contains(String),
}

impl WildcardPattern {
    /// Parse a wildcard pattern, rejecting anything outside the grammar above
    pub fn parse(pattern: &str) -> std::result::Result<Self, String> {
        let parts: Vec<&str> = pattern.split('%').collect();

        match parts.as_slice() {
            [literal] => Ok(WildcardPattern::Literal(literal.to_string())),
            [prefix, suffix] => Ok(WildcardPattern::Affix {
                prefix: prefix.to_string(),
                suffix: suffix.to_string(),
            }),
            ["", middle, ""] if !middle.is_empty() => {
                Ok(WildcardPattern::Contains(middle.to_string()))
            }
            _ => Err(format!(
                "'{}' uses more than one wildcard; only X%, %X, X%Y and %X% are supported. \
                 Use match_kind \"regex\" for richer patterns",
                pattern
            )),
        }
    }

    /// Check an event name against this pattern
    pub fn matches(&self, name: &str) -> bool {
        match self {
            WildcardPattern::Literal(literal) => name == literal,
            WildcardPattern::Affix { prefix, suffix } => {
                name.len() >= prefix.len() + suffix.len()
                    && name.starts_with(prefix.as_str())
                    && name.ends_with(suffix.as_str())
            }
            WildcardPattern::Contains(needle) => name.contains(needle.as_str()),
        }
    }
}

/// Compile a regex mapping pattern
///
/// Patterns always match the whole event name. The body is wrapped in an
/// anchored group even when the author already wrote `^` or `$`; an escaped
/// `\$` stays a literal.
fn compile_regex(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})$", pattern))
}

#[derive(Debug, Clone)]
enum PatternMatcher {
    Exact(String),
    Wildcard(WildcardPattern),
    Regex(Regex),
}

impl PatternMatcher {
    fn compile(mapping: &EventMapping) -> Result<Self> {
        let pattern = mapping.pattern.as_str();
        match mapping.effective_kind() {
            MatchKind::Exact => Ok(PatternMatcher::Exact(pattern.to_string())),
            MatchKind::Wildcard => WildcardPattern::parse(pattern)
                .map(PatternMatcher::Wildcard)
                .map_err(|reason| ZmanError::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason,
                }),
            MatchKind::Regex => compile_regex(pattern)
                .map(PatternMatcher::Regex)
                .map_err(|e| ZmanError::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            PatternMatcher::Exact(pattern) => name == pattern,
            PatternMatcher::Wildcard(pattern) => pattern.matches(name),
            PatternMatcher::Regex(regex) => regex.is_match(name),
        }
    }
}

/// A mapping with its pattern compiled
#[derive(Debug, Clone)]
pub struct CompiledMapping {
    /// The source mapping
    pub mapping: EventMapping,
    /// Resolved match kind
    pub kind: MatchKind,
    /// Position in the source list (final tie-break)
    pub position: usize,
    matcher: PatternMatcher,
}

impl CompiledMapping {
    /// Check an event name against this mapping
    pub fn matches(&self, event_name: &str) -> bool {
        self.matcher.matches(event_name)
    }

    fn sort_key(&self) -> (i32, MatchKind, usize) {
        (self.mapping.priority, self.kind, self.position)
    }
}

/// A tag resolved from an event name, with the mapping that won for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMatch {
    pub tag_key: String,
    pub pattern: String,
    pub match_kind: MatchKind,
    pub priority: i32,
}

/// Compiled, priority-ordered mapping table
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    /// Entries sorted most-specific first
    entries: Vec<CompiledMapping>,
}

impl MappingTable {
    /// Compile mappings. Fails on the first pattern that does not compile.
    ///
    /// Tag references are not checked here; see the configuration validator.
    pub fn compile(mappings: Vec<EventMapping>) -> Result<Self> {
        let mut entries = Vec::with_capacity(mappings.len());
        for (position, mapping) in mappings.into_iter().enumerate() {
            let matcher = PatternMatcher::compile(&mapping)?;
            entries.push(CompiledMapping {
                kind: mapping.effective_kind(),
                mapping,
                position,
                matcher,
            });
        }
        entries.sort_by_key(|e| e.sort_key());
        Ok(Self { entries })
    }

    /// Resolve an event name to one [`TagMatch`] per matching tag
    ///
    /// Results are ordered by the winning mapping's specificity.
    pub fn match_event(&self, event_name: &str) -> Vec<TagMatch> {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut matches = Vec::new();

        for entry in &self.entries {
            if seen.contains(entry.mapping.tag_key.as_str()) {
                continue;
            }
            if entry.matches(event_name) {
                seen.insert(entry.mapping.tag_key.as_str());
                matches.push(TagMatch {
                    tag_key: entry.mapping.tag_key.clone(),
                    pattern: entry.mapping.pattern.clone(),
                    match_kind: entry.kind,
                    priority: entry.mapping.priority,
                });
            }
        }

        tracing::trace!(event = event_name, matched = matches.len(), "matched event name");
        matches
    }

    /// Resolve an event name to the set of matching tag keys
    pub fn match_tags(&self, event_name: &str) -> BTreeSet<String> {
        self.match_event(event_name)
            .into_iter()
            .map(|m| m.tag_key)
            .collect()
    }

    /// Entries, most specific first
    pub fn iter(&self) -> impl Iterator<Item = &CompiledMapping> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolve an event name against a mapping table
pub fn match_tags(event_name: &str, mappings: &MappingTable) -> BTreeSet<String> {
    mappings.match_tags(event_name)
}
