use std::collections::HashSet;

use crate::error::ProjectionError;
use crate::keyspace::Keyspace;
use crate::record::{codec, Projection, Record};
use crate::scanner::KeyScanner;
use crate::store::KeyValueStore;

/// Position window over a collection in scan order.
///
/// `limit` is the number of records returned: the window is
/// `[skip, skip + limit)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub skip: usize,
    pub limit: Option<usize>,
}

impl QueryOptions {
    /// Every record in the collection.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn page(skip: usize, limit: usize) -> Self {
        Self {
            skip,
            limit: Some(limit),
        }
    }

    fn window(&self, keys: Vec<String>) -> Vec<String> {
        let selected = keys.into_iter().skip(self.skip);
        match self.limit {
            Some(limit) => selected.take(limit).collect(),
            None => selected.collect(),
        }
    }
}

/// Loads records and wraps them as projections ready for a later commit.
pub struct RecordReader<'a, S: ?Sized> {
    store: &'a S,
    keyspace: &'a Keyspace,
    scan_count: usize,
}

impl<'a, S: KeyValueStore + ?Sized> RecordReader<'a, S> {
    pub fn new(store: &'a S, keyspace: &'a Keyspace, scan_count: usize) -> Self {
        Self {
            store,
            keyspace,
            scan_count,
        }
    }

    /// Read one record.
    ///
    /// A missing key yields a placeholder with [`Action::None`](crate::Action::None);
    /// a stored one comes back marked for update.
    pub fn read(&self, collection: &str, id: &str) -> Result<Projection, ProjectionError> {
        let key = self.keyspace.record_key(collection, id);
        Ok(match self.load(&key)? {
            Some(record) => Projection::loaded(collection, record),
            None => Projection::placeholder(collection, id),
        })
    }

    /// Every record of `collection` inside the `options` window, in scan order.
    ///
    /// Keys that vanish between the scan and the read are skipped.
    pub fn find_all(
        &self,
        collection: &str,
        options: QueryOptions,
    ) -> Result<Vec<Projection>, ProjectionError> {
        let pattern = self.keyspace.collection_pattern(collection);

        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        KeyScanner::new(self.store, self.scan_count).for_each_batch(
            &pattern,
            |batch| -> Result<(), ProjectionError> {
                keys.extend(batch.into_iter().filter(|key| seen.insert(key.clone())));
                Ok(())
            },
        )?;

        let selected = options.window(keys);
        tracing::debug!(target: "kv_projections::read", collection, selected = selected.len(), "find all");

        let mut projections = Vec::with_capacity(selected.len());
        for key in &selected {
            if let Some(record) = self.load(key)? {
                projections.push(Projection::loaded(collection, record));
            }
        }
        Ok(projections)
    }

    /// Whichever record the scan reaches first. Not ordered by id or age.
    pub fn find_one(&self, collection: &str) -> Result<Option<Projection>, ProjectionError> {
        let pattern = self.keyspace.collection_pattern(collection);

        for batch in KeyScanner::new(self.store, self.scan_count).batches(&pattern) {
            for key in batch? {
                if let Some(record) = self.load(&key)? {
                    return Ok(Some(Projection::loaded(collection, record)));
                }
            }
        }
        Ok(None)
    }

    fn load(&self, key: &str) -> Result<Option<Record>, ProjectionError> {
        let Some(bytes) = self.store.get(key)? else {
            return Ok(None);
        };

        codec::decode(&bytes).map(Some).map_err(|err| {
            tracing::warn!(target: "kv_projections::read", key, error = %err, "unreadable record");
            ProjectionError::serialization(key, err)
        })
    }
}
