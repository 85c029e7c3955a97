//! Key-value store client contract.
//!
//! The projection layer never talks to a concrete database. Everything it
//! needs is expressed by [`KeyValueStore`]: plain reads and writes, an atomic
//! counter, cursor-based pattern scans, and a watch/exec pair that commits a
//! batch of commands only if a watched key was left untouched.
//!
//! [`InMemoryStore`] implements the full contract and backs the test suites.

#[cfg(feature = "emitter")]
mod events;
mod in_memory;
mod pattern;

#[cfg(feature = "emitter")]
pub use events::{ConnectionEvent, ConnectionEvents};
pub use in_memory::InMemoryStore;
pub use pattern::{escape_pattern, glob_match};

/// Cursor value that starts a scan and marks its end.
pub const SCAN_START: u64 = 0;

/// Errors raised by the store client itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The client has no open connection.
    #[error("store connection is closed")]
    ConnectionClosed,
    /// `incr` hit a key holding something other than a decimal integer.
    #[error("value at {key} is not an integer")]
    NotAnInteger { key: String },
    /// Any other client or server failure (network, auth, protocol).
    #[error("store error: {0}")]
    Backend(String),
}

/// A write queued inside a conditional transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set { key: String, value: Vec<u8> },
    Delete { key: String },
}

/// Per-command acknowledgement returned by a committed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Ok,
    Deleted(bool),
}

/// Registration of interest in one key.
///
/// `stamp` is whatever the backend uses to notice that the key changed
/// between `watch` and `exec` (a modification counter for the in-memory store).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watch {
    key: String,
    stamp: u64,
}

impl Watch {
    pub fn new(key: impl Into<String>, stamp: u64) -> Self {
        Self {
            key: key.into(),
            stamp,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn stamp(&self) -> u64 {
        self.stamp
    }
}

/// Capabilities the projection layer requires from a key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value at `key`.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Write `value` at `key` unconditionally.
    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Remove `key`. Returns true if it existed.
    fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Check whether `key` holds a value.
    fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Atomically increment the integer at `key` (missing counts as 0)
    /// and return the new value.
    fn incr(&self, key: &str) -> Result<i64, StoreError>;

    /// One page of a cursor scan over keys matching the glob `pattern`.
    ///
    /// Start with [`SCAN_START`]; a returned cursor equal to [`SCAN_START`]
    /// means the scan is complete. Pages may be empty while the cursor is
    /// still live. `count` is a hint for how much of the keyspace to visit.
    /// Every key present for the whole scan is returned at least once.
    fn scan(&self, cursor: u64, pattern: &str, count: usize)
        -> Result<(u64, Vec<String>), StoreError>;

    /// List every key matching `pattern` in a single call.
    fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError>;

    /// Start watching `key` for modifications.
    fn watch(&self, key: &str) -> Result<Watch, StoreError>;

    /// Drop a watch without executing anything.
    fn unwatch(&self, watch: Watch) -> Result<(), StoreError>;

    /// Run `commands` atomically if the watched key is unchanged.
    ///
    /// Returns `None` when the transaction was aborted.
    fn exec(&self, watch: Watch, commands: Vec<Command>)
        -> Result<Option<Vec<Reply>>, StoreError>;

    /// Whether the client currently holds a usable connection.
    fn is_connected(&self) -> bool {
        true
    }
}
