//! Visibility engine
//!
//! Composes the calendar provider, the configuration store, the
//! Active-Tag-Set builder and the visibility filter into the end-to-end
//! "should this item be shown on this date" operation.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::active::{ActiveTagResolution, ActiveTagSet, ActiveTagSetBuilder, BuilderConfig};
use crate::calendar::{CalendarProvider, Location};
use crate::config::{ConfigHandle, TagConfig};
use crate::error::Result;
use crate::filter::{VisibilityDecision, VisibilityFilter};
use crate::store::ConfigStore;
use crate::tags::Tag;

/// End-to-end visibility computation
///
/// Holds the current configuration snapshot; every request takes the
/// snapshot once and uses it throughout, so a concurrent
/// [`refresh_config`](Self::refresh_config) never mixes two snapshots within
/// one answer.
pub struct VisibilityEngine<C, S>
where
    C: CalendarProvider,
    S: ConfigStore,
{
    calendar: Arc<C>,
    store: Arc<S>,
    config: ConfigHandle,
    settings: BuilderConfig,
}

impl<C, S> VisibilityEngine<C, S>
where
    C: CalendarProvider,
    S: ConfigStore,
{
    /// Load and validate the configuration, then build the engine
    ///
    /// Fails if the store is unavailable or the configuration is invalid;
    /// the engine never serves results filtered against broken configuration.
    pub async fn new(calendar: Arc<C>, store: Arc<S>, settings: BuilderConfig) -> Result<Self> {
        let config = load_snapshot(store.as_ref()).await?;

        tracing::info!(
            calendar = calendar.name(),
            store = store.name(),
            tags = config.catalog().len(),
            mappings = config.mappings().len(),
            "visibility engine ready"
        );

        Ok(Self {
            calendar,
            store,
            config: ConfigHandle::new(config),
            settings,
        })
    }

    /// Reload the configuration from the store and swap it in
    ///
    /// On failure the current snapshot stays in effect. Returns the new
    /// snapshot version.
    pub async fn refresh_config(&self) -> Result<u64> {
        let config = load_snapshot(self.store.as_ref()).await?;
        self.config.replace(config);
        Ok(self.config.version())
    }

    /// The snapshot in effect right now
    pub fn config(&self) -> Arc<TagConfig> {
        self.config.current()
    }

    pub fn settings(&self) -> &BuilderConfig {
        &self.settings
    }

    /// Active tag keys for a date and location
    pub async fn active_tags(&self, date: NaiveDate, location: &Location) -> ActiveTagSet {
        self.resolve_active_tags(date, location).await.tags
    }

    /// Active tag keys with provenance and degradation report
    pub async fn resolve_active_tags(
        &self,
        date: NaiveDate,
        location: &Location,
    ) -> ActiveTagResolution {
        let snapshot = self.config.current();
        self.resolve_with(&snapshot, date, location).await
    }

    /// Whether an item should be shown on `date` at `location`
    pub async fn compute_visibility(
        &self,
        item_id: &str,
        date: NaiveDate,
        location: &Location,
    ) -> Result<bool> {
        Ok(self.evaluate(item_id, date, location).await?.is_shown())
    }

    /// Full visibility decision for an item
    #[tracing::instrument(skip(self, date, location), fields(date = %date))]
    pub async fn evaluate(
        &self,
        item_id: &str,
        date: NaiveDate,
        location: &Location,
    ) -> Result<VisibilityDecision> {
        let snapshot = self.config.current();

        let (resolution, assignments) = tokio::join!(
            self.resolve_with(&snapshot, date, location),
            self.store.load_item_tag_assignments(item_id),
        );
        let assignments = assignments?;

        let decision = self
            .filter(&snapshot)
            .evaluate(&assignments, &resolution.tags);
        tracing::debug!(item = item_id, state = ?decision.state, "visibility decided");

        Ok(decision)
    }

    /// Visibility for many items, building the Active-Tag-Set once
    #[tracing::instrument(skip_all, fields(date = %date, items = item_ids.len()))]
    pub async fn compute_visibility_batch<I>(
        &self,
        item_ids: &[I],
        date: NaiveDate,
        location: &Location,
    ) -> Result<BTreeMap<String, bool>>
    where
        I: AsRef<str> + Sync,
    {
        let snapshot = self.config.current();
        let resolution = self.resolve_with(&snapshot, date, location).await;
        let filter = self.filter(&snapshot);

        let mut results = BTreeMap::new();
        for item_id in item_ids {
            let item_id = item_id.as_ref();
            let assignments = self.store.load_item_tag_assignments(item_id).await?;
            results.insert(
                item_id.to_string(),
                filter.should_show(&assignments, &resolution.tags),
            );
        }

        Ok(results)
    }

    /// Tags shown by presentation collaborators (non-hidden), in catalog order
    pub fn visible_tags(&self) -> Vec<Tag> {
        self.config.current().catalog().visible().cloned().collect()
    }

    async fn resolve_with(
        &self,
        snapshot: &TagConfig,
        date: NaiveDate,
        location: &Location,
    ) -> ActiveTagResolution {
        ActiveTagSetBuilder::with_settings(snapshot, self.settings.clone())
            .build_detailed(date, location, self.calendar.as_ref())
            .await
    }

    fn filter<'a>(&self, snapshot: &'a TagConfig) -> VisibilityFilter<'a> {
        VisibilityFilter::new(snapshot.catalog()).with_markers(self.settings.markers())
    }
}

async fn load_snapshot<S: ConfigStore + ?Sized>(store: &S) -> Result<TagConfig> {
    let (tags, mappings) = tokio::try_join!(store.load_tag_catalog(), store.load_event_mappings())?;
    TagConfig::load(tags, mappings)
}
