//! Configuration store
//!
//! Read-only source of the tag catalog, the event mappings and the per-item
//! tag assignments. Implement [`ConfigStore`] to back the engine with a
//! database or a remote service; [`InMemoryConfigStore`] is the default.
//!
//! # Example
//!
//! ```rust
//! use zman_core::store::InMemoryConfigStore;
//!
//! let store = InMemoryConfigStore::from_json(r#"{
//!     "tags": [{ "key": "chanukah", "category": "event" }],
//!     "mappings": [{ "tag_key": "chanukah", "pattern": "Chanukah%" }],
//!     "assignments": [{ "item_id": "candle_lighting", "tag_key": "chanukah" }]
//! }"#).unwrap();
//! assert_eq!(store.item_count(), 1);
//! ```

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::config::TagConfigDocument;
use crate::error::{Result, ZmanError};
use crate::filter::ZmanTagAssignment;
use crate::mapping::EventMapping;
use crate::tags::Tag;

/// Source of tag configuration data
///
/// All methods take `&self` so implementations can use interior mutability.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Every tag definition
    async fn load_tag_catalog(&self) -> Result<Vec<Tag>>;

    /// Every event mapping
    async fn load_event_mappings(&self) -> Result<Vec<EventMapping>>;

    /// Assignments for one item; empty if the item has none
    async fn load_item_tag_assignments(&self, item_id: &str) -> Result<Vec<ZmanTagAssignment>>;

    /// Store name (for logging)
    fn name(&self) -> &'static str;
}

/// In-memory configuration store
#[derive(Debug, Default)]
pub struct InMemoryConfigStore {
    tags: RwLock<Vec<Tag>>,
    mappings: RwLock<Vec<EventMapping>>,
    assignments: RwLock<HashMap<String, Vec<ZmanTagAssignment>>>,
    unavailable: RwLock<Option<String>>,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a parsed document
    pub fn from_document(document: TagConfigDocument) -> Self {
        let store = Self::new();
        store.set_tags(document.tags);
        store.set_mappings(document.mappings);
        store.set_assignments(document.assignments);
        store
    }

    /// Build from a JSON document with `tags`, `mappings` and `assignments`
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::from_document(TagConfigDocument::from_json(json)?))
    }

    /// Build from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_document(TagConfigDocument::from_file(path)?))
    }

    pub fn set_tags(&self, tags: Vec<Tag>) {
        *self.tags.write() = tags;
    }

    pub fn set_mappings(&self, mappings: Vec<EventMapping>) {
        *self.mappings.write() = mappings;
    }

    /// Replace all assignments
    pub fn set_assignments(&self, assignments: Vec<ZmanTagAssignment>) {
        let mut by_item: HashMap<String, Vec<ZmanTagAssignment>> = HashMap::new();
        for assignment in assignments {
            by_item
                .entry(assignment.item_id.clone())
                .or_default()
                .push(assignment);
        }
        *self.assignments.write() = by_item;
    }

    /// Add one assignment
    pub fn assign(&self, assignment: ZmanTagAssignment) {
        self.assignments
            .write()
            .entry(assignment.item_id.clone())
            .or_default()
            .push(assignment);
    }

    /// Make every load fail with `StoreUnavailable`
    pub fn set_unavailable(&self, reason: impl Into<String>) {
        *self.unavailable.write() = Some(reason.into());
    }

    /// Clear a previous [`set_unavailable`](Self::set_unavailable)
    pub fn set_available(&self) {
        *self.unavailable.write() = None;
    }

    /// Number of items with at least one assignment
    pub fn item_count(&self) -> usize {
        self.assignments.read().len()
    }

    fn check_available(&self) -> Result<()> {
        match self.unavailable.read().as_ref() {
            Some(reason) => Err(ZmanError::StoreUnavailable {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ConfigStore for InMemoryConfigStore {
    async fn load_tag_catalog(&self) -> Result<Vec<Tag>> {
        self.check_available()?;
        Ok(self.tags.read().clone())
    }

    async fn load_event_mappings(&self) -> Result<Vec<EventMapping>> {
        self.check_available()?;
        Ok(self.mappings.read().clone())
    }

    async fn load_item_tag_assignments(&self, item_id: &str) -> Result<Vec<ZmanTagAssignment>> {
        self.check_available()?;
        Ok(self
            .assignments
            .read()
            .get(item_id)
            .cloned()
            .unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "in_memory"
    }
}
