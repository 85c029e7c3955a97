//! ProjectionRepository - projection storage on top of any `KeyValueStore`.

use std::thread;

use crate::commit::CommitProtocol;
use crate::config::StoreConfig;
use crate::error::ProjectionError;
use crate::id_allocator::IdAllocator;
use crate::keyspace::Keyspace;
use crate::reader::{QueryOptions, RecordReader};
use crate::record::Projection;
use crate::registry::CollectionRegistry;
use crate::store::{KeyValueStore, StoreError};

use super::{Clear, Commit, Find, FindOne, Get};

pub const DEFAULT_SCAN_COUNT: usize = 100;

/// Stores projections in a key-value store with optimistic locking.
///
/// Every operation registers its collection with the repository's
/// [`CollectionRegistry`] and fails with [`ProjectionError::NotConnected`]
/// when the store reports no live connection.
pub struct ProjectionRepository<S> {
    store: S,
    keyspace: Keyspace,
    registry: CollectionRegistry,
    scan_count: usize,
}

impl<S: KeyValueStore> ProjectionRepository<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            keyspace: Keyspace::default(),
            registry: CollectionRegistry::new(),
            scan_count: DEFAULT_SCAN_COUNT,
        }
    }

    /// Use the prefix and scan page size from `config`.
    pub fn with_config(store: S, config: &StoreConfig) -> Self {
        Self {
            keyspace: Keyspace::new(config.prefix.clone()),
            scan_count: config.scan_count.max(1),
            ..Self::new(store)
        }
    }

    /// Share a registry with other repositories.
    pub fn with_registry(mut self, registry: CollectionRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    pub fn registry(&self) -> &CollectionRegistry {
        &self.registry
    }

    /// Allocate the next id of `collection`.
    pub fn allocate_id(&self, collection: &str) -> Result<String, ProjectionError> {
        self.prepare(collection)?;
        Ok(IdAllocator::new(&self.store, &self.keyspace).allocate(collection)?)
    }

    fn prepare(&self, collection: &str) -> Result<(), ProjectionError> {
        if self.registry.register(collection) {
            tracing::debug!(target: "kv_projections::registry", collection, "collection registered");
        }
        if !self.store.is_connected() {
            return Err(ProjectionError::NotConnected);
        }
        Ok(())
    }

    fn reader(&self) -> RecordReader<'_, S> {
        RecordReader::new(&self.store, &self.keyspace, self.scan_count)
    }

    /// Remove every record key of `collection` with one listing call.
    fn remove_records(&self, collection: &str) -> Result<usize, ProjectionError> {
        let keys = self
            .store
            .keys(&self.keyspace.collection_pattern(collection))?;

        let mut removed = 0;
        for key in &keys {
            if self.store.delete(key)? {
                removed += 1;
            }
        }

        tracing::debug!(target: "kv_projections::clear", collection, removed, "collection cleared");
        Ok(removed)
    }

    fn reset_collection(&self, collection: &str) -> Result<(), ProjectionError> {
        self.store.delete(&self.keyspace.counter_key(collection))?;
        self.remove_records(collection)?;
        Ok(())
    }
}

impl<S: KeyValueStore> Get for ProjectionRepository<S> {
    fn get(&self, collection: &str, id: Option<&str>) -> Result<Projection, ProjectionError> {
        self.prepare(collection)?;
        match id {
            Some(id) => self.reader().read(collection, id),
            None => {
                let id = IdAllocator::new(&self.store, &self.keyspace).allocate(collection)?;
                self.reader().read(collection, &id)
            }
        }
    }
}

impl<S: KeyValueStore> Find for ProjectionRepository<S> {
    fn find(
        &self,
        collection: &str,
        options: QueryOptions,
    ) -> Result<Vec<Projection>, ProjectionError> {
        self.prepare(collection)?;
        self.reader().find_all(collection, options)
    }
}

impl<S: KeyValueStore> FindOne for ProjectionRepository<S> {
    fn find_one(&self, collection: &str) -> Result<Option<Projection>, ProjectionError> {
        self.prepare(collection)?;
        self.reader().find_one(collection)
    }
}

impl<S: KeyValueStore> Commit for ProjectionRepository<S> {
    fn commit(&self, projection: &mut Projection) -> Result<(), ProjectionError> {
        self.prepare(projection.collection())?;
        CommitProtocol::new(&self.store, &self.keyspace, self.scan_count).commit(projection)
    }
}

impl<S: KeyValueStore> Clear for ProjectionRepository<S> {
    fn clear(&self, collection: &str) -> Result<usize, ProjectionError> {
        self.prepare(collection)?;
        self.remove_records(collection)
    }

    fn clear_all(&self) -> Result<(), ProjectionError> {
        if !self.store.is_connected() {
            return Err(ProjectionError::NotConnected);
        }

        let collections = self.registry.collections();
        tracing::debug!(target: "kv_projections::clear", collections = collections.len(), "clearing all collections");

        thread::scope(|scope| {
            let workers: Vec<_> = collections
                .iter()
                .map(|collection| scope.spawn(move || self.reset_collection(collection)))
                .collect();

            workers
                .into_iter()
                .map(|worker| {
                    worker.join().unwrap_or_else(|_| {
                        Err(StoreError::Backend("clear worker panicked".into()).into())
                    })
                })
                .collect::<Result<Vec<()>, ProjectionError>>()
        })?;

        Ok(())
    }
}
