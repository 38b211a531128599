//! Tag configuration snapshots
//!
//! A [`TagConfig`] is an immutable, validated snapshot of the tag catalog and
//! the compiled mapping table. It is loaded once, handed out behind an `Arc`,
//! and replaced wholesale on refresh (see [`ConfigHandle`]); nothing mutates a
//! snapshot in place.

mod handle;
mod loader;
mod validator;

pub use handle::ConfigHandle;
pub use loader::{TagConfigDocument, TagConfigLoader};
pub use validator::{ConfigValidator, ValidationIssue, ValidationResult};

use std::collections::HashSet;

use crate::error::{Result, ZmanError};
use crate::mapping::{EventMapping, MappingTable};
use crate::tags::{Tag, TagCatalog};

/// Validated tag catalog and mapping table
#[derive(Debug, Clone)]
pub struct TagConfig {
    /// Snapshot version, bumped on every swap
    pub version: u64,
    catalog: TagCatalog,
    mappings: MappingTable,
}

impl TagConfig {
    /// Validate and build a snapshot
    ///
    /// Fails fast on any structural problem: a malformed mapping is never
    /// skipped, since that would silently stop a class of events from
    /// resolving.
    ///
    /// When the only problems are mappings pointing at missing tags, the first
    /// one is reported as [`ZmanError::UnknownTagReference`]; anything else
    /// yields [`ZmanError::InvalidConfiguration`] with the full report.
    pub fn load(tags: Vec<Tag>, mappings: Vec<EventMapping>) -> Result<Self> {
        let validation = ConfigValidator::new().validate(&tags, &mappings);

        for warning in &validation.warnings {
            tracing::warn!(code = %warning.code, "{}", warning);
        }

        if !validation.is_valid {
            if validation.errors.iter().all(|e| e.code == "E004") {
                if let Some(mapping) = first_unknown_reference(&tags, &mappings) {
                    return Err(ZmanError::UnknownTagReference {
                        tag_key: mapping.tag_key.clone(),
                        pattern: mapping.pattern.clone(),
                    });
                }
            }
            return Err(ZmanError::InvalidConfiguration {
                reason: validation.error_report(),
            });
        }

        Ok(Self {
            version: 1,
            catalog: TagCatalog::new(tags)?,
            mappings: MappingTable::compile(mappings)?,
        })
    }

    /// An empty configuration: no tags, no mappings
    pub fn empty() -> Self {
        Self {
            version: 1,
            catalog: TagCatalog::default(),
            mappings: MappingTable::default(),
        }
    }

    pub fn catalog(&self) -> &TagCatalog {
        &self.catalog
    }

    pub fn mappings(&self) -> &MappingTable {
        &self.mappings
    }
}

fn first_unknown_reference<'a>(
    tags: &[Tag],
    mappings: &'a [EventMapping],
) -> Option<&'a EventMapping> {
    let known: HashSet<&str> = tags.iter().map(|t| t.key.as_str()).collect();
    mappings.iter().find(|m| !known.contains(m.tag_key.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_valid_config() {
        let config = TagConfig::load(
            vec![Tag::event("purim"), Tag::jewish_day("yom_tov").hidden()],
            vec![EventMapping::exact("purim", "Purim")],
        )
        .unwrap();

        assert_eq!(config.version, 1);
        assert_eq!(config.catalog().len(), 2);
        assert_eq!(config.mappings().len(), 1);
    }

    #[test]
    fn test_load_rejects_unknown_tag() {
        let err = TagConfig::load(
            vec![Tag::event("purim")],
            vec![EventMapping::exact("shushan_purim", "Shushan Purim")],
        )
        .unwrap_err();

        assert!(err.is_configuration_error());
        assert!(err.to_string().contains("shushan_purim"));
        match err {
            ZmanError::UnknownTagReference { tag_key, pattern } => {
                assert_eq!(tag_key, "shushan_purim");
                assert_eq!(pattern, "Shushan Purim");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_unknown_tag_alongside_other_errors_reports_all() {
        let err = TagConfig::load(
            vec![Tag::event("purim")],
            vec![
                EventMapping::exact("shushan_purim", "Shushan Purim"),
                EventMapping::exact("purim", ""),
            ],
        )
        .unwrap_err();

        match err {
            ZmanError::InvalidConfiguration { reason } => {
                assert!(reason.contains("E003"));
                assert!(reason.contains("E004"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_empty_config() {
        let config = TagConfig::empty();
        assert!(config.catalog().is_empty());
        assert!(config.mappings().is_empty());
    }
}
