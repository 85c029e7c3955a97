//! Projection storage for CQRS read sides on top of a key-value store.
//!
//! Records are stored at `<collection>:<id>` and guarded by optimistic
//! locking: every write stamps a fresh version, creates fail on existing
//! ids, and updates fail if someone else wrote the record since it was read.
//! Collections are enumerated with cursor scans, never by loading the
//! whole keyspace.

mod commit;
mod config;
mod error;
mod id_allocator;
mod keyspace;
mod read_model;
mod reader;
mod record;
mod registry;
mod repository;
mod scanner;
pub mod store;

pub use commit::CommitProtocol;
pub use config::{Address, StoreConfig};
pub use error::{ConfigError, ConflictKind, ProjectionError};
pub use id_allocator::IdAllocator;
pub use keyspace::Keyspace;
pub use read_model::{ReadModel, ReadModelRepository, ReadModelsExt, Versioned};
pub use reader::{QueryOptions, RecordReader};
pub use record::{Action, Fields, Projection, Record, Value};
pub use registry::CollectionRegistry;
pub use repository::{
    Clear, Commit, Find, FindOne, Get, ProjectionRepository, Repository, DEFAULT_SCAN_COUNT,
};
pub use scanner::{KeyBatches, KeyScanner};
pub use store::{InMemoryStore, KeyValueStore, StoreError};

// Derive macro for read models
pub use kv_projections_macros::ReadModel;
