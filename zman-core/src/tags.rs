//! Tag catalog
//!
//! Tags are the semantic labels that gate or group displayable items. Every
//! behavior the engine attaches to a tag is declared on the tag itself
//! (category, full-restriction flag, timing modifier); nothing is inferred
//! from tag keys or event names at evaluation time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ZmanError};

/// What a tag is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagCategory {
    /// A specific observance (e.g. `rosh_hashanah`)
    Event,
    /// A generic day type (e.g. `fast_day`, `yom_tov`)
    JewishDay,
    /// UI grouping only, never used for filtering
    DisplayCategory,
    /// Changes how an item's event tags are matched (see [`TimingModifier`])
    Timing,
}

impl TagCategory {
    /// Whether assignments of this category take part in visibility filtering
    pub fn is_filterable(&self) -> bool {
        matches!(self, TagCategory::Event | TagCategory::JewishDay)
    }
}

impl std::fmt::Display for TagCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagCategory::Event => write!(f, "event"),
            TagCategory::JewishDay => write!(f, "jewish_day"),
            TagCategory::DisplayCategory => write!(f, "display_category"),
            TagCategory::Timing => write!(f, "timing"),
        }
    }
}

/// Timing modifier carried by `timing` tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingModifier {
    /// Match the eve of the item's events (`erev_<key>`)
    DayBefore,
    /// Match the conclusion of the item's events (`motzei_<key>`)
    Motzei,
}

/// A tag definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Unique, immutable identifier (e.g. "erev_shabbos")
    pub key: String,

    /// Tag category
    pub category: TagCategory,

    /// Hidden from end-user tag listings; has no effect on filtering
    #[serde(default)]
    pub is_hidden: bool,

    /// Full-restriction day: resolving this tag for an adjacent day yields
    /// `erev_<key>` / `motzei_<key>` on the current day
    #[serde(default)]
    pub is_full_restriction: bool,

    /// Required on `timing` tags, forbidden on the others
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<TimingModifier>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name_hebrew: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name_english: Option<String>,
}

impl Tag {
    /// Create a tag with the given category
    pub fn new(key: impl Into<String>, category: TagCategory) -> Self {
        Self {
            key: key.into(),
            category,
            is_hidden: false,
            is_full_restriction: false,
            timing: None,
            display_name_hebrew: None,
            display_name_english: None,
        }
    }

    /// Create an `event` tag
    pub fn event(key: impl Into<String>) -> Self {
        Self::new(key, TagCategory::Event)
    }

    /// Create a `jewish_day` tag
    pub fn jewish_day(key: impl Into<String>) -> Self {
        Self::new(key, TagCategory::JewishDay)
    }

    /// Create a `display_category` tag
    pub fn display_category(key: impl Into<String>) -> Self {
        Self::new(key, TagCategory::DisplayCategory)
    }

    /// Create a `timing` tag with its modifier
    pub fn timing(key: impl Into<String>, modifier: TimingModifier) -> Self {
        let mut tag = Self::new(key, TagCategory::Timing);
        tag.timing = Some(modifier);
        tag
    }

    /// Mark as a full-restriction day
    pub fn full_restriction(mut self) -> Self {
        self.is_full_restriction = true;
        self
    }

    /// Hide from end-user listings
    pub fn hidden(mut self) -> Self {
        self.is_hidden = true;
        self
    }

    pub fn with_display_names(
        mut self,
        hebrew: impl Into<String>,
        english: impl Into<String>,
    ) -> Self {
        self.display_name_hebrew = Some(hebrew.into());
        self.display_name_english = Some(english.into());
        self
    }
}

/// Lookup table of tag definitions, keyed by tag key
#[derive(Debug, Clone, Default)]
pub struct TagCatalog {
    /// Tags in load order
    tags: Vec<Tag>,

    /// key -> position in `tags`
    index: HashMap<String, usize>,
}

impl TagCatalog {
    /// Build a catalog, rejecting duplicate keys
    pub fn new(tags: Vec<Tag>) -> Result<Self> {
        let mut index = HashMap::with_capacity(tags.len());
        for (position, tag) in tags.iter().enumerate() {
            if index.insert(tag.key.clone(), position).is_some() {
                return Err(ZmanError::DuplicateTag {
                    tag_key: tag.key.clone(),
                });
            }
        }
        Ok(Self { tags, index })
    }

    /// Get a tag by key
    pub fn get(&self, key: &str) -> Option<&Tag> {
        self.index.get(key).map(|&i| &self.tags[i])
    }

    /// Check if a tag exists
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Category of a tag, if known
    pub fn category_of(&self, key: &str) -> Option<TagCategory> {
        self.get(key).map(|t| t.category)
    }

    /// Whether the tag is declared as a full-restriction day
    pub fn is_full_restriction(&self, key: &str) -> bool {
        self.get(key).is_some_and(|t| t.is_full_restriction)
    }

    /// All tags in load order, hidden ones included
    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }

    /// Tags that may be shown in end-user listings
    pub fn visible(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter().filter(|t| !t.is_hidden)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
