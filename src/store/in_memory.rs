//! InMemoryStore - BTreeMap-backed key-value store for testing and development.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[cfg(feature = "emitter")]
use super::{ConnectionEvent, ConnectionEvents};
use super::{glob_match, Command, KeyValueStore, Reply, StoreError, Watch, SCAN_START};

const ENDPOINT: &str = "memory";

struct State {
    entries: BTreeMap<String, Vec<u8>>,
    /// Last modification stamp per key, kept after deletes so watches see them.
    stamps: HashMap<String, u64>,
    clock: u64,
    /// Open scan cursors, each resuming after the last key it returned.
    cursors: HashMap<u64, String>,
    cursor_clock: u64,
    connected: bool,
}

impl State {
    fn stamp(&self, key: &str) -> u64 {
        self.stamps.get(key).copied().unwrap_or(0)
    }

    fn touch(&mut self, key: &str) {
        self.clock += 1;
        self.stamps.insert(key.to_string(), self.clock);
    }

    fn put(&mut self, key: &str, value: Vec<u8>) {
        self.entries.insert(key.to_string(), value);
        self.touch(key);
    }

    fn remove(&mut self, key: &str) -> bool {
        let existed = self.entries.remove(key).is_some();
        if existed {
            self.touch(key);
        }
        existed
    }
}

/// In-memory key-value store.
///
/// Keys are kept in order and a scan cursor resumes after the last key of
/// the page that issued it, so keys deleted or added mid-scan never hide
/// keys that were present throughout. Cursors are single-use.
/// Clone-friendly via Arc: clones share data and connection state.
#[derive(Clone)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
    #[cfg(feature = "emitter")]
    events: Arc<ConnectionEvents>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Create an empty, connected store.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State {
                entries: BTreeMap::new(),
                stamps: HashMap::new(),
                clock: 0,
                cursors: HashMap::new(),
                cursor_clock: 0,
                connected: true,
            })),
            #[cfg(feature = "emitter")]
            events: Arc::new(ConnectionEvents::new()),
        }
    }

    /// Lifecycle listeners for this store.
    #[cfg(feature = "emitter")]
    pub fn events(&self) -> &ConnectionEvents {
        &self.events
    }

    /// Re-open the connection. Data survives a disconnect.
    pub fn connect(&self) {
        self.state.write().connected = true;
        #[cfg(feature = "emitter")]
        self.events
            .emit(ConnectionEvent::Connected(ENDPOINT.to_string()));
    }

    /// Close the connection; every operation fails until `connect` is called.
    pub fn disconnect(&self) {
        self.state.write().connected = false;
        #[cfg(feature = "emitter")]
        self.events
            .emit(ConnectionEvent::Disconnected(ENDPOINT.to_string()));
    }

    /// Publish a client error to listeners without changing state.
    pub fn report_error(&self, message: &str) {
        tracing::warn!(target: "kv_projections::store", endpoint = ENDPOINT, error = message, "store client error");
        #[cfg(feature = "emitter")]
        self.events.emit(ConnectionEvent::Error(message.to_string()));
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        let state = self.state.read();
        if !state.connected {
            return Err(StoreError::ConnectionClosed);
        }
        Ok(state)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        let state = self.state.write();
        if !state.connected {
            return Err(StoreError::ConnectionClosed);
        }
        Ok(state)
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.read()?.entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.write()?.put(key, value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.write()?.remove(key))
    }

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.read()?.entries.contains_key(key))
    }

    fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let mut state = self.write()?;

        let current = match state.entries.get(key) {
            Some(bytes) => std::str::from_utf8(bytes)
                .ok()
                .and_then(|text| text.parse::<i64>().ok())
                .ok_or_else(|| StoreError::NotAnInteger {
                    key: key.to_string(),
                })?,
            None => 0,
        };

        let next = current
            .checked_add(1)
            .ok_or_else(|| StoreError::Backend(format!("increment of {} would overflow", key)))?;
        state.put(key, next.to_string().into_bytes());
        Ok(next)
    }

    fn scan(
        &self,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> Result<(u64, Vec<String>), StoreError> {
        let mut state = self.write()?;
        let count = count.max(1);

        let resume = if cursor == SCAN_START {
            Bound::Unbounded
        } else {
            let last = state.cursors.remove(&cursor).ok_or_else(|| {
                StoreError::Backend(format!("unknown scan cursor {}", cursor))
            })?;
            Bound::Excluded(last)
        };

        let page: Vec<&String> = state
            .entries
            .range::<String, _>((resume, Bound::Unbounded))
            .map(|(key, _)| key)
            .take(count)
            .collect();

        let keys: Vec<String> = page
            .iter()
            .filter(|key| glob_match(pattern, key))
            .map(|key| (*key).clone())
            .collect();

        let last = match page.last() {
            Some(last) if page.len() == count => (*last).clone(),
            _ => return Ok((SCAN_START, keys)),
        };
        let more = state
            .entries
            .range::<String, _>((Bound::Excluded(&last), Bound::Unbounded))
            .next()
            .is_some();
        if !more {
            return Ok((SCAN_START, keys));
        }

        state.cursor_clock += 1;
        let next = state.cursor_clock;
        state.cursors.insert(next, last);
        Ok((next, keys))
    }

    fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let state = self.read()?;
        Ok(state
            .entries
            .keys()
            .filter(|key| glob_match(pattern, key))
            .cloned()
            .collect())
    }

    fn watch(&self, key: &str) -> Result<Watch, StoreError> {
        let state = self.read()?;
        Ok(Watch::new(key, state.stamp(key)))
    }

    fn unwatch(&self, _watch: Watch) -> Result<(), StoreError> {
        self.read()?;
        Ok(())
    }

    fn exec(
        &self,
        watch: Watch,
        commands: Vec<Command>,
    ) -> Result<Option<Vec<Reply>>, StoreError> {
        let mut state = self.write()?;

        if state.stamp(watch.key()) != watch.stamp() {
            return Ok(None);
        }

        let replies = commands
            .into_iter()
            .map(|command| match command {
                Command::Set { key, value } => {
                    state.put(&key, value);
                    Reply::Ok
                }
                Command::Delete { key } => Reply::Deleted(state.remove(&key)),
            })
            .collect();

        Ok(Some(replies))
    }

    fn is_connected(&self) -> bool {
        self.state.read().connected
    }
}
