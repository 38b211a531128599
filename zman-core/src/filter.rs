//! Visibility filter
//!
//! Decides show/hide for one item from its tag assignments and the
//! Active-Tag-Set of the date. Evaluation order is fixed:
//! 1. No qualifying (event / jewish_day) assignments: always shown
//! 2. Any negated assignment whose tag is active: hidden, no matter what else
//!    matches
//! 3. No positive assignments: shown
//! 4. Otherwise shown iff at least one positive assignment's tag is active
//!
//! `display_category` assignments are metadata and never affect the result.
//! `timing` assignments don't qualify on their own; they redirect the
//! positive matches of step 4 to the `erev_` / `motzei_` form of each key.

use serde::{Deserialize, Serialize};

use crate::active::{ActiveTagSet, DayMarkers};
use crate::tags::{TagCatalog, TagCategory, TimingModifier};

/// Link between a displayable item and a tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZmanTagAssignment {
    pub item_id: String,
    pub tag_key: String,
    /// Excluded rather than required
    #[serde(default)]
    pub is_negated: bool,
}

impl ZmanTagAssignment {
    /// A required (non-negated) assignment
    pub fn new(item_id: impl Into<String>, tag_key: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            tag_key: tag_key.into(),
            is_negated: false,
        }
    }

    /// An excluding (negated) assignment
    pub fn negated(item_id: impl Into<String>, tag_key: impl Into<String>) -> Self {
        Self {
            is_negated: true,
            ..Self::new(item_id, tag_key)
        }
    }
}

/// Which branch of the evaluation decided the outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum VisibilityState {
    /// No qualifying tags; the item is not context-dependent
    AlwaysShow,
    /// Evaluated against the active tags
    Conditional { shown: bool },
    /// A negated tag is active
    ForceHide,
}

/// Outcome of filtering one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityDecision {
    pub state: VisibilityState,
    /// Active keys that satisfied positive assignments
    pub matched_tags: Vec<String>,
    /// Negated tag that forced the item hidden
    pub excluded_by: Option<String>,
}

impl VisibilityDecision {
    fn new(state: VisibilityState) -> Self {
        Self {
            state,
            matched_tags: Vec::new(),
            excluded_by: None,
        }
    }

    /// Whether the item is shown
    pub fn is_shown(&self) -> bool {
        match self.state {
            VisibilityState::AlwaysShow => true,
            VisibilityState::Conditional { shown } => shown,
            VisibilityState::ForceHide => false,
        }
    }
}

/// Filter bound to a tag catalog
///
/// Total and side-effect free. Assignments whose tag is missing from the
/// catalog (a stale reference) are treated as ordinary qualifying tags; they
/// simply never find their key in the active set.
#[derive(Debug, Clone)]
pub struct VisibilityFilter<'a> {
    catalog: &'a TagCatalog,
    markers: DayMarkers,
}

impl<'a> VisibilityFilter<'a> {
    pub fn new(catalog: &'a TagCatalog) -> Self {
        Self {
            catalog,
            markers: DayMarkers::default(),
        }
    }

    /// Use custom erev/motzei prefixes for timing modifiers
    pub fn with_markers(mut self, markers: DayMarkers) -> Self {
        self.markers = markers;
        self
    }

    /// Show/hide for an item
    pub fn should_show(&self, assignments: &[ZmanTagAssignment], active: &ActiveTagSet) -> bool {
        self.evaluate(assignments, active).is_shown()
    }

    /// Evaluate an item, reporting which branch decided
    pub fn evaluate(
        &self,
        assignments: &[ZmanTagAssignment],
        active: &ActiveTagSet,
    ) -> VisibilityDecision {
        let mut qualifying: Vec<&ZmanTagAssignment> = Vec::with_capacity(assignments.len());
        let mut modifier: Option<TimingModifier> = None;

        for assignment in assignments {
            match self.catalog.get(&assignment.tag_key) {
                Some(tag) if tag.category == TagCategory::Timing => {
                    if !assignment.is_negated {
                        // day_before takes precedence over motzei
                        modifier = match (modifier, tag.timing) {
                            (Some(TimingModifier::DayBefore), _) => Some(TimingModifier::DayBefore),
                            (_, Some(timing)) => Some(timing),
                            (current, None) => current,
                        };
                    }
                }
                Some(tag) if !tag.category.is_filterable() => {}
                _ => qualifying.push(assignment),
            }
        }

        if qualifying.is_empty() {
            return VisibilityDecision::new(VisibilityState::AlwaysShow);
        }

        if let Some(excluded) = qualifying
            .iter()
            .find(|a| a.is_negated && active.contains(&a.tag_key))
        {
            tracing::debug!(
                item = %excluded.item_id,
                tag = %excluded.tag_key,
                "item hidden by negated tag"
            );
            let mut decision = VisibilityDecision::new(VisibilityState::ForceHide);
            decision.excluded_by = Some(excluded.tag_key.clone());
            return decision;
        }

        let positives: Vec<&ZmanTagAssignment> =
            qualifying.into_iter().filter(|a| !a.is_negated).collect();
        if positives.is_empty() {
            return VisibilityDecision::new(VisibilityState::Conditional { shown: true });
        }

        let matched_tags: Vec<String> = positives
            .iter()
            .map(|a| self.effective_key(&a.tag_key, modifier))
            .filter(|key| active.contains(key))
            .collect();

        VisibilityDecision {
            state: VisibilityState::Conditional {
                shown: !matched_tags.is_empty(),
            },
            matched_tags,
            excluded_by: None,
        }
    }

    fn effective_key(&self, tag_key: &str, modifier: Option<TimingModifier>) -> String {
        match modifier {
            Some(TimingModifier::DayBefore) => self.markers.erev(tag_key),
            Some(TimingModifier::Motzei) => self.markers.motzei(tag_key),
            None => tag_key.to_string(),
        }
    }
}

/// Show/hide for an item's assignments against an Active-Tag-Set
pub fn should_show(
    assignments: &[ZmanTagAssignment],
    active: &ActiveTagSet,
    catalog: &TagCatalog,
) -> bool {
    VisibilityFilter::new(catalog).should_show(assignments, active)
}
