//! Tag configuration loader
//!
//! Loads tag configuration documents from:
//! - JSON strings
//! - JSON files (reloadable)
//! - Already-deserialized documents
//!
//! Every path goes parse -> validate -> build; there is no unvalidated load.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::TagConfig;
use crate::error::{Result, ZmanError};
use crate::filter::ZmanTagAssignment;
use crate::mapping::EventMapping;
use crate::tags::Tag;

/// On-disk / wire shape of a tag configuration
///
/// ```json
/// {
///   "tags": [{ "key": "yom_kippur", "category": "event", "is_full_restriction": true }],
///   "mappings": [{ "tag_key": "yom_kippur", "pattern": "Yom Kippur" }],
///   "assignments": [{ "item_id": "candle_lighting", "tag_key": "yom_kippur" }]
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagConfigDocument {
    #[serde(default)]
    pub tags: Vec<Tag>,

    #[serde(default)]
    pub mappings: Vec<EventMapping>,

    /// Item assignments; only consumed by configuration stores
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assignments: Vec<ZmanTagAssignment>,
}

impl TagConfigDocument {
    /// Parse a document from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a document from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ZmanError::ConfigLoadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "malformed tag configuration");
            ZmanError::from(e)
        })
    }
}

/// Loader for tag configuration snapshots
#[derive(Debug, Default)]
pub struct TagConfigLoader {
    /// Last file loaded, for reload
    source_path: Option<PathBuf>,
}

impl TagConfigLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self { source_path: None }
    }

    /// Load a snapshot from a JSON string
    pub fn load_from_json(&self, json: &str) -> Result<TagConfig> {
        self.load_from_document(TagConfigDocument::from_json(json)?)
    }

    /// Load a snapshot from a JSON file, remembering the path for [`reload`](Self::reload)
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<TagConfig> {
        let path = path.as_ref();
        let config = self.load_from_document(TagConfigDocument::from_file(path)?)?;
        self.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Build a snapshot from a parsed document
    pub fn load_from_document(&self, document: TagConfigDocument) -> Result<TagConfig> {
        TagConfig::load(document.tags, document.mappings)
    }

    /// Load the last file again
    pub fn reload(&self) -> Result<TagConfig> {
        let path = self
            .source_path
            .as_ref()
            .ok_or_else(|| ZmanError::ConfigLoadError {
                path: "<none>".to_string(),
                reason: "No source path available for reload".to_string(),
            })?;

        self.load_from_document(TagConfigDocument::from_file(path)?)
    }

    /// Path of the last file loaded
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }
}
