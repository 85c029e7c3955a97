//! Read Models - typed views over projection records.
//!
//! A read model is any serde type that names its collection and id. Its
//! fields are stored as a record's fields, so typed and untyped access see
//! the same data and share the same optimistic locking.
//!
//! ## Example
//!
//! ```ignore
//! use kv_projections::{InMemoryStore, ProjectionRepository, ReadModel, ReadModelsExt};
//!
//! #[derive(Serialize, Deserialize, Clone, ReadModel)]
//! #[read_model(collection = "game_views")]
//! struct GameView {
//!     #[read_model(id)]
//!     pub id: String,
//!     pub score: u32,
//! }
//!
//! let repo = ProjectionRepository::new(InMemoryStore::new());
//! let saved = repo.read_models::<GameView>().insert(&view)?;
//! let loaded = repo.read_models::<GameView>().get("game-1")?;
//! ```

mod repository;

use serde::{de::DeserializeOwned, Serialize};

/// Trait for types that can be stored as read models.
pub trait ReadModel: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// The collection this type is stored in.
    const COLLECTION: &'static str;

    /// Returns the unique identifier for this read model instance.
    fn id(&self) -> String;
}

/// A read model together with the version token it was read or written at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub data: T,
    pub version: String,
}

pub use repository::{ReadModelRepository, ReadModelsExt};
