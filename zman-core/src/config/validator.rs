//! Tag configuration validator
//!
//! Collects every problem in a tag catalog / mapping table pair before the
//! snapshot is built, so a broken configuration is reported in one pass:
//! - Tag identifiers (empty, duplicate)
//! - Timing modifiers declared on the right categories
//! - Mapping patterns (empty, compilable, within the wildcard grammar)
//! - Cross-references from mappings to tags

use std::collections::{HashMap, HashSet};

use crate::mapping::{EventMapping, MappingTable, MatchKind};
use crate::tags::{Tag, TagCategory};

/// Validation result with detailed findings
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// Whether validation passed
    pub is_valid: bool,

    /// Error-level issues that must be fixed
    pub errors: Vec<ValidationIssue>,

    /// Warning-level issues that should be addressed
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: vec![],
            warnings: vec![],
        }
    }

    /// Add an error
    pub fn add_error(&mut self, issue: ValidationIssue) {
        self.is_valid = false;
        self.errors.push(issue);
    }

    /// Add a warning
    pub fn add_warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }

    /// Error messages joined for an error report
    pub fn error_report(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Get a summary string
    pub fn summary(&self) -> String {
        format!(
            "{}: {} errors, {} warnings",
            if self.is_valid { "VALID" } else { "INVALID" },
            self.errors.len(),
            self.warnings.len()
        )
    }
}

/// A single validation issue
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Issue code
    pub code: String,

    /// Human-readable message
    pub message: String,

    /// Path to the problematic element (e.g., "mappings[3].pattern")
    pub path: Option<String>,

    /// Suggested fix
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Create a new issue
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            path: None,
            suggestion: None,
        }
    }

    /// Set the path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] ", self.code)?;
        if let Some(path) = &self.path {
            write!(f, "{}: ", path)?;
        }
        write!(f, "{}", self.message)
    }
}

/// Tag configuration validator
#[derive(Debug, Default)]
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a tag catalog and the mappings that reference it
    pub fn validate(&self, tags: &[Tag], mappings: &[EventMapping]) -> ValidationResult {
        let mut result = ValidationResult::valid();

        let known = self.validate_tags(tags, &mut result);
        self.validate_mappings(mappings, &known, &mut result);
        self.check_redundant_mappings(mappings, &mut result);

        result
    }

    fn validate_tags<'a>(
        &self,
        tags: &'a [Tag],
        result: &mut ValidationResult,
    ) -> HashSet<&'a str> {
        let mut known = HashSet::with_capacity(tags.len());

        for (i, tag) in tags.iter().enumerate() {
            let path = format!("tags[{}]", i);

            if tag.key.trim().is_empty() {
                result.add_error(
                    ValidationIssue::new("E001", "tag key cannot be empty")
                        .with_path(format!("{}.key", path)),
                );
                continue;
            }

            if !known.insert(tag.key.as_str()) {
                result.add_error(
                    ValidationIssue::new("E002", format!("duplicate tag key '{}'", tag.key))
                        .with_path(format!("{}.key", path)),
                );
            }

            match (tag.category, tag.timing) {
                (TagCategory::Timing, None) => result.add_error(
                    ValidationIssue::new(
                        "E007",
                        format!("timing tag '{}' has no timing modifier", tag.key),
                    )
                    .with_path(format!("{}.timing", path))
                    .with_suggestion("Set timing to \"day_before\" or \"motzei\""),
                ),
                (category, Some(_)) if category != TagCategory::Timing => result.add_error(
                    ValidationIssue::new(
                        "E007",
                        format!(
                            "tag '{}' has a timing modifier but category '{}'",
                            tag.key, category
                        ),
                    )
                    .with_path(format!("{}.timing", path)),
                ),
                _ => {}
            }
        }

        known
    }

    fn validate_mappings(
        &self,
        mappings: &[EventMapping],
        known: &HashSet<&str>,
        result: &mut ValidationResult,
    ) {
        for (i, mapping) in mappings.iter().enumerate() {
            let path = format!("mappings[{}]", i);

            if mapping.pattern.is_empty() {
                result.add_error(
                    ValidationIssue::new(
                        "E003",
                        format!("mapping for tag '{}' has an empty pattern", mapping.tag_key),
                    )
                    .with_path(format!("{}.pattern", path)),
                );
            } else if let Err(e) = MappingTable::compile(vec![mapping.clone()]) {
                let (code, suggestion) = match mapping.effective_kind() {
                    MatchKind::Wildcard => ("E006", "Promote the pattern to match_kind \"regex\""),
                    _ => ("E005", "Check the regular expression syntax"),
                };
                result.add_error(
                    ValidationIssue::new(code, e.to_string())
                        .with_path(format!("{}.pattern", path))
                        .with_suggestion(suggestion),
                );
            }

            if !known.contains(mapping.tag_key.as_str()) {
                result.add_error(
                    ValidationIssue::new(
                        "E004",
                        format!(
                            "mapping '{}' references unknown tag '{}'",
                            mapping.pattern, mapping.tag_key
                        ),
                    )
                    .with_path(format!("{}.tag_key", path)),
                );
            }
        }
    }

    fn check_redundant_mappings(&self, mappings: &[EventMapping], result: &mut ValidationResult) {
        let mut first_seen: HashMap<(&str, MatchKind, &str), usize> = HashMap::new();

        for (i, mapping) in mappings.iter().enumerate() {
            let key = (
                mapping.tag_key.as_str(),
                mapping.effective_kind(),
                mapping.pattern.as_str(),
            );
            if let Some(first) = first_seen.get(&key) {
                result.add_warning(
                    ValidationIssue::new(
                        "W001",
                        format!(
                            "mapping duplicates mappings[{}] ('{}' -> '{}')",
                            first, mapping.pattern, mapping.tag_key
                        ),
                    )
                    .with_path(format!("mappings[{}]", i))
                    .with_suggestion("Remove the redundant mapping"),
                );
            } else {
                first_seen.insert(key, i);
            }
        }
    }
}
