//! Shared handle to the current configuration snapshot

use std::sync::Arc;

use parking_lot::RwLock;

use super::TagConfig;

/// Holds the current [`TagConfig`] and swaps it atomically
///
/// Readers take an `Arc` to the snapshot and keep it for the whole request,
/// so a concurrent refresh never changes the data under them. The lock only
/// guards the pointer swap.
#[derive(Debug)]
pub struct ConfigHandle {
    current: RwLock<Arc<TagConfig>>,
}

impl ConfigHandle {
    pub fn new(config: TagConfig) -> Self {
        Self {
            current: RwLock::new(Arc::new(config)),
        }
    }

    /// The snapshot in effect right now
    pub fn current(&self) -> Arc<TagConfig> {
        Arc::clone(&self.current.read())
    }

    /// Version of the snapshot in effect
    pub fn version(&self) -> u64 {
        self.current.read().version
    }

    /// Swap in a new snapshot, returning the previous one
    ///
    /// The new snapshot's version is set to one past the previous version.
    pub fn replace(&self, mut config: TagConfig) -> Arc<TagConfig> {
        let mut current = self.current.write();
        config.version = current.version + 1;
        let previous = std::mem::replace(&mut *current, Arc::new(config));

        tracing::info!(
            previous_version = previous.version,
            version = current.version,
            tags = current.catalog().len(),
            mappings = current.mappings().len(),
            "swapped tag configuration snapshot"
        );

        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::EventMapping;
    use crate::tags::Tag;

    #[test]
    fn test_replace_bumps_version() {
        let handle = ConfigHandle::new(TagConfig::empty());
        assert_eq!(handle.version(), 1);

        let next = TagConfig::load(
            vec![Tag::event("purim")],
            vec![EventMapping::exact("purim", "Purim")],
        )
        .unwrap();
        let previous = handle.replace(next);

        assert_eq!(previous.version, 1);
        assert_eq!(handle.version(), 2);
        assert_eq!(handle.current().catalog().len(), 1);
    }

    #[test]
    fn test_readers_keep_their_snapshot() {
        let handle = ConfigHandle::new(TagConfig::empty());
        let held = handle.current();

        handle.replace(
            TagConfig::load(vec![Tag::event("purim")], vec![]).unwrap(),
        );

        // The reader's snapshot is unchanged
        assert!(held.catalog().is_empty());
        assert_eq!(held.version, 1);
        assert!(handle.current().catalog().contains("purim"));
    }

    #[test]
    fn test_concurrent_readers_see_whole_snapshots() {
        let handle = Arc::new(ConfigHandle::new(TagConfig::empty()));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let handle = Arc::clone(&handle);
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        let snapshot = handle.current();
                        // Catalog and mappings always come from the same load
                        assert_eq!(snapshot.catalog().len(), snapshot.mappings().len());
                    }
                })
            })
            .collect();

        for i in 0..50 {
            let key = format!("tag_{}", i);
            let config = TagConfig::load(
                vec![Tag::event(key.clone())],
                vec![EventMapping::exact(key.clone(), key)],
            )
            .unwrap();
            handle.replace(config);
        }

        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(handle.version(), 51);
    }
}
