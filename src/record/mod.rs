//! Records and the in-memory projections that carry them between reads and commits.
//!
//! A [`Record`] is what gets stored: an id, named fields, and the version
//! token of its last successful write. A [`Projection`] wraps a record with
//! the collection it belongs to and the [`Action`] the caller intends for the
//! next commit. The action stays in memory; it is never serialized.
//!
//! ## Example
//!
//! ```ignore
//! use kv_projections::{Get, Commit, InMemoryStore, ProjectionRepository};
//!
//! let repo = ProjectionRepository::new(InMemoryStore::new());
//!
//! let mut view = repo.get("game_views", Some("game-1"))?;
//! view.set("score", 100);
//! view.mark_create();
//! repo.commit(&mut view)?;
//! ```

pub(crate) mod codec;
mod value;

use serde::{de::DeserializeOwned, Serialize};

pub use value::{Fields, Value};

/// A stored projection entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: String,
    fields: Fields,
    version: Option<String>,
}

impl Record {
    /// A record that has never been committed.
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_fields(id, Fields::new())
    }

    pub fn with_fields(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
            version: None,
        }
    }

    /// Build a record from any serde type that serializes to a map.
    pub fn from_data<T: Serialize>(
        id: impl Into<String>,
        data: &T,
    ) -> Result<Self, serde_json::Error> {
        match serde_json::to_value(data)? {
            serde_json::Value::Object(map) => Ok(Self::with_fields(
                id,
                map.into_iter()
                    .map(|(name, value)| (name, Value::from_json(value)))
                    .collect(),
            )),
            _ => Err(<serde_json::Error as serde::ser::Error>::custom(
                "record data must serialize to a map",
            )),
        }
    }

    /// Deserialize the fields into a serde type.
    pub fn to_data<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(value::fields_to_json(&self.fields))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Version token of the last successful write, if any.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub(crate) fn set_version(&mut self, version: Option<String>) {
        self.version = version;
    }
}

/// What the next commit should do with a projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    /// Nothing declared yet; committing fails.
    #[default]
    None,
    /// Write a record that must not exist yet.
    Create,
    /// Overwrite the record, provided nobody else wrote it since it was read.
    Update,
    /// Remove the record unconditionally.
    Delete,
}

/// A record in flight between the store and the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    collection: String,
    record: Record,
    action: Action,
}

impl Projection {
    pub fn new(collection: impl Into<String>, record: Record, action: Action) -> Self {
        Self {
            collection: collection.into(),
            record,
            action,
        }
    }

    /// A brand-new record ready to be committed as a create.
    pub fn create(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new(collection, Record::new(id), Action::Create)
    }

    /// An id with nothing stored behind it.
    pub(crate) fn placeholder(collection: &str, id: &str) -> Self {
        Self::new(collection, Record::new(id), Action::None)
    }

    /// A record just read from the store.
    pub(crate) fn loaded(collection: &str, record: Record) -> Self {
        Self::new(collection, record, Action::Update)
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn id(&self) -> &str {
        self.record.id()
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }

    pub fn into_record(self) -> Record {
        self.record
    }

    pub fn fields(&self) -> &Fields {
        self.record.fields()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.record.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.record.set(name, value);
    }

    pub fn version(&self) -> Option<&str> {
        self.record.version()
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn set_action(&mut self, action: Action) {
        self.action = action;
    }

    pub fn mark_create(&mut self) {
        self.action = Action::Create;
    }

    pub fn mark_update(&mut self) {
        self.action = Action::Update;
    }

    pub fn mark_delete(&mut self) {
        self.action = Action::Delete;
    }
}
