//! Optimistic concurrency control for projection writes.
//!
//! There are no multi-key transactions here. Each write is guarded by the
//! store's watch/exec primitive on the record's own key:
//!
//! - **create** watches the key, fails if it already exists, then writes
//!   through a conditional exec so a racing create is caught too.
//! - **update** watches the key, compares the persisted version with the one
//!   the caller read, and writes through a conditional exec. A version
//!   mismatch or an aborted exec is a lost update.
//! - **delete** removes the key unconditionally.
//!
//! Every successful write stamps the record with a fresh random version.

use uuid::Uuid;

use crate::error::{ConflictKind, ProjectionError};
use crate::keyspace::Keyspace;
use crate::reader::RecordReader;
use crate::record::{codec, Action, Projection};
use crate::store::{Command, KeyValueStore, Reply, Watch};

pub struct CommitProtocol<'a, S: ?Sized> {
    store: &'a S,
    keyspace: &'a Keyspace,
    reader: RecordReader<'a, S>,
}

impl<'a, S: KeyValueStore + ?Sized> CommitProtocol<'a, S> {
    pub fn new(store: &'a S, keyspace: &'a Keyspace, scan_count: usize) -> Self {
        Self {
            store,
            keyspace,
            reader: RecordReader::new(store, keyspace, scan_count),
        }
    }

    /// Apply the projection's pending action.
    ///
    /// On success a created or updated projection carries its new version and
    /// is marked for update; a deleted one loses its version and action. On
    /// failure the projection is left untouched.
    pub fn commit(&self, projection: &mut Projection) -> Result<(), ProjectionError> {
        match projection.action() {
            Action::Create => self.create(projection),
            Action::Update => self.update(projection),
            Action::Delete => self.delete(projection),
            Action::None => Err(ProjectionError::InvalidIntent {
                collection: projection.collection().to_string(),
                id: projection.id().to_string(),
            }),
        }
    }

    fn delete(&self, projection: &mut Projection) -> Result<(), ProjectionError> {
        let key = self.keyspace.record_key(projection.collection(), projection.id());
        let existed = self.store.delete(&key)?;
        tracing::debug!(target: "kv_projections::commit", key = %key, existed, "record deleted");

        projection.record_mut().set_version(None);
        projection.set_action(Action::None);
        Ok(())
    }

    fn create(&self, projection: &mut Projection) -> Result<(), ProjectionError> {
        let key = self.keyspace.record_key(projection.collection(), projection.id());
        let watch = self.store.watch(&key)?;

        match self.store.exists(&key) {
            Ok(false) => {}
            Ok(true) => {
                return Err(self.abandon(
                    watch,
                    self.conflict(projection, ConflictKind::AlreadyExists),
                ))
            }
            Err(err) => return Err(self.abandon(watch, err.into())),
        }

        if let Err(err) = self.check_version(projection) {
            return Err(self.abandon(watch, err));
        }

        self.write(projection, &key, watch)
    }

    fn update(&self, projection: &mut Projection) -> Result<(), ProjectionError> {
        let key = self.keyspace.record_key(projection.collection(), projection.id());
        let watch = self.store.watch(&key)?;

        if let Err(err) = self.check_version(projection) {
            return Err(self.abandon(watch, err));
        }

        self.write(projection, &key, watch)
    }

    /// Re-read the record and fail if its persisted version differs from ours.
    /// Nothing to compare when either side has no version yet.
    fn check_version(&self, projection: &Projection) -> Result<(), ProjectionError> {
        let persisted = self
            .reader
            .read(projection.collection(), projection.id())?;

        match (projection.version(), persisted.version()) {
            (Some(expected), Some(actual)) if expected != actual => Err(self.conflict(
                projection,
                ConflictKind::VersionMismatch {
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                },
            )),
            _ => Ok(()),
        }
    }

    fn write(
        &self,
        projection: &mut Projection,
        key: &str,
        watch: Watch,
    ) -> Result<(), ProjectionError> {
        let version = Uuid::new_v4().to_string();

        let mut staged = projection.record().clone();
        staged.set_version(Some(version.clone()));
        let value = match codec::encode(&staged) {
            Ok(value) => value,
            Err(err) => return Err(self.abandon(watch, ProjectionError::serialization(key, err))),
        };

        let replies = self.store.exec(
            watch,
            vec![Command::Set {
                key: key.to_string(),
                value,
            }],
        )?;

        if replies.as_deref() != Some(&[Reply::Ok][..]) {
            return Err(self.conflict(projection, ConflictKind::TransactionAborted));
        }

        tracing::debug!(target: "kv_projections::commit", key, version = %version, action = ?projection.action(), "record written");
        projection.record_mut().set_version(Some(version));
        projection.set_action(Action::Update);
        Ok(())
    }

    fn conflict(&self, projection: &Projection, kind: ConflictKind) -> ProjectionError {
        tracing::warn!(
            target: "kv_projections::commit",
            collection = projection.collection(),
            id = projection.id(),
            conflict = %kind,
            "optimistic lock violation"
        );
        ProjectionError::conflict(projection.collection(), projection.id(), kind)
    }

    /// Release a watch on a failed path, keeping the original error.
    fn abandon(&self, watch: Watch, err: ProjectionError) -> ProjectionError {
        if let Err(unwatch_err) = self.store.unwatch(watch) {
            tracing::debug!(target: "kv_projections::commit", error = %unwatch_err, "unwatch failed");
        }
        err
    }
}
