//! Cursor-driven enumeration of a collection's keys.
//!
//! [`KeyScanner::batches`] returns a lazy iterator that issues one scan
//! request per `next()` call (skipping empty pages) until the store hands
//! back the terminal cursor. Only one request is ever outstanding, and the
//! caller decides when to ask for the next page simply by pulling again.

use crate::store::{KeyValueStore, StoreError, SCAN_START};

pub struct KeyScanner<'a, S: ?Sized> {
    store: &'a S,
    count: usize,
}

impl<'a, S: KeyValueStore + ?Sized> KeyScanner<'a, S> {
    pub fn new(store: &'a S, count: usize) -> Self {
        Self { store, count }
    }

    /// Start a fresh scan over keys matching `pattern`.
    pub fn batches(&self, pattern: &str) -> KeyBatches<'a, S> {
        KeyBatches {
            store: self.store,
            pattern: pattern.to_string(),
            count: self.count,
            cursor: Some(SCAN_START),
        }
    }

    /// Feed every non-empty batch to `on_batch`, stopping at the first error.
    pub fn for_each_batch<E, F>(&self, pattern: &str, mut on_batch: F) -> Result<(), E>
    where
        E: From<StoreError>,
        F: FnMut(Vec<String>) -> Result<(), E>,
    {
        for batch in self.batches(pattern) {
            on_batch(batch?)?;
        }
        Ok(())
    }
}

/// Non-empty key batches from one scan. Keys may repeat across batches
/// when the keyspace changes mid-scan.
pub struct KeyBatches<'a, S: ?Sized> {
    store: &'a S,
    pattern: String,
    count: usize,
    /// `None` once the scan finished or failed.
    cursor: Option<u64>,
}

impl<S: KeyValueStore + ?Sized> Iterator for KeyBatches<'_, S> {
    type Item = Result<Vec<String>, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let cursor = self.cursor?;
            match self.store.scan(cursor, &self.pattern, self.count) {
                Ok((next, keys)) => {
                    self.cursor = (next != SCAN_START).then_some(next);
                    if !keys.is_empty() {
                        tracing::trace!(target: "kv_projections::scan", pattern = %self.pattern, keys = keys.len(), "scan batch");
                        return Some(Ok(keys));
                    }
                }
                Err(err) => {
                    self.cursor = None;
                    tracing::debug!(target: "kv_projections::scan", pattern = %self.pattern, error = %err, "scan aborted");
                    return Some(Err(err));
                }
            }
        }
    }
}

impl<S: KeyValueStore + ?Sized> std::iter::FusedIterator for KeyBatches<'_, S> {}
