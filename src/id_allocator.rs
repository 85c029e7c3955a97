use crate::keyspace::Keyspace;
use crate::store::{KeyValueStore, StoreError};

/// Issues per-collection ids from an atomic counter in the store.
pub struct IdAllocator<'a, S: ?Sized> {
    store: &'a S,
    keyspace: &'a Keyspace,
}

impl<'a, S: KeyValueStore + ?Sized> IdAllocator<'a, S> {
    pub fn new(store: &'a S, keyspace: &'a Keyspace) -> Self {
        Self { store, keyspace }
    }

    /// Increment the collection's counter and return the new value as an id.
    pub fn allocate(&self, collection: &str) -> Result<String, StoreError> {
        let next = self.store.incr(&self.keyspace.counter_key(collection))?;
        Ok(next.to_string())
    }
}
