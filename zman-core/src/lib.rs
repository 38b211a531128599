//! # Zman Core - Event-Tag Resolution and Visibility Filtering
//!
//! Decides, for a calendar date and location, which of a publisher's
//! configured zmanim (time-of-day items) should be displayed:
//!
//! - **Pattern matching**: external calendar event names are classified into
//!   tags through a data-driven mapping table (exact, single-wildcard, regex)
//! - **Active-Tag-Set**: the tags in effect for a date, including day-of-week
//!   tags and erev/motzei tags derived from the adjacent days
//! - **Visibility filtering**: per-item positive and negated tag assignments
//!   evaluated against the Active-Tag-Set; negation always wins
//!
//! Holiday behaviour lives entirely in configuration. Whether a tag warrants
//! erev/motzei derivation is a declared attribute of the tag
//! (`is_full_restriction`), never inferred from an event name.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use chrono::NaiveDate;
//! use zman_core::{
//!     BuilderConfig, InMemoryConfigStore, Location, StaticCalendar, VisibilityEngine,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> zman_core::Result<()> {
//! let store = InMemoryConfigStore::from_json(r#"{
//!     "tags": [
//!         { "key": "yom_kippur", "category": "event", "is_full_restriction": true },
//!         { "key": "fast_day", "category": "jewish_day", "is_hidden": true }
//!     ],
//!     "mappings": [
//!         { "tag_key": "yom_kippur", "pattern": "Yom Kippur" },
//!         { "tag_key": "fast_day", "pattern": "Tzom%" }
//!     ],
//!     "assignments": [
//!         { "item_id": "candle_lighting", "tag_key": "erev_shabbos" },
//!         { "item_id": "candle_lighting", "tag_key": "erev_yom_kippur" },
//!         { "item_id": "candle_lighting", "tag_key": "fast_day", "is_negated": true }
//!     ]
//! }"#)?;
//!
//! let yom_kippur = NaiveDate::from_ymd_opt(2025, 10, 2).unwrap();
//! let calendar = StaticCalendar::new().with_events(yom_kippur, ["Yom Kippur"]);
//!
//! let engine = VisibilityEngine::new(
//!     Arc::new(calendar),
//!     Arc::new(store),
//!     BuilderConfig::default(),
//! )
//! .await?;
//!
//! let jerusalem = Location::new(31.7683, 35.2137, "Asia/Jerusalem");
//! let erev = yom_kippur.pred_opt().unwrap();
//!
//! assert!(engine.compute_visibility("candle_lighting", erev, &jerusalem).await?);
//! assert!(!engine.compute_visibility("candle_lighting", yom_kippur, &jerusalem).await?);
//! # Ok(())
//! # }
//! ```

pub mod active;
pub mod calendar;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod mapping;
pub mod store;
pub mod tags;

// Re-export main types
pub use active::{
    build_active_tag_set, ActiveTagResolution, ActiveTagSet, ActiveTagSetBuilder, BuilderConfig,
    DayEvents, DayMarkers, DayOffset, DegradedFetch, TagSource,
};
pub use calendar::{CalendarProvider, Location, StaticCalendar};
pub use config::{
    ConfigHandle, ConfigValidator, TagConfig, TagConfigDocument, TagConfigLoader,
    ValidationIssue, ValidationResult,
};
pub use engine::VisibilityEngine;
pub use error::{ErrorCategory, ErrorDetail, ErrorResponse, Result, ZmanError};
pub use filter::{
    should_show, VisibilityDecision, VisibilityFilter, VisibilityState, ZmanTagAssignment,
};
pub use mapping::{match_tags, EventMapping, MappingTable, MatchKind, TagMatch};
pub use store::{ConfigStore, InMemoryConfigStore};
pub use tags::{Tag, TagCatalog, TagCategory, TimingModifier};
