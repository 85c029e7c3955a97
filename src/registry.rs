use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::RwLock;

/// Names of every collection a repository has touched.
///
/// Append-only. Clones share the same set, so repositories that should be
/// cleared together by `clear_all` are built with clones of one registry;
/// repositories built without one each get their own.
#[derive(Debug, Clone, Default)]
pub struct CollectionRegistry {
    collections: Arc<RwLock<BTreeSet<String>>>,
}

impl CollectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `collection`. Returns true the first time it is seen.
    pub fn register(&self, collection: &str) -> bool {
        if self.collections.read().contains(collection) {
            return false;
        }
        self.collections.write().insert(collection.to_string())
    }

    pub fn contains(&self, collection: &str) -> bool {
        self.collections.read().contains(collection)
    }

    /// Snapshot of the registered names, sorted.
    pub fn collections(&self) -> Vec<String> {
        self.collections.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.collections.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
