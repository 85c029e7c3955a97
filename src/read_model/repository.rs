//! ReadModelRepository - Typed accessor for read model operations.

use std::marker::PhantomData;

use crate::error::ProjectionError;
use crate::reader::QueryOptions;
use crate::record::{Action, Projection, Record};
use crate::repository::{Commit, Find, FindOne, Get, ProjectionRepository};
use crate::store::KeyValueStore;

use super::{ReadModel, Versioned};

/// Typed repository wrapper for read models of one type.
pub struct ReadModelRepository<'a, S, M> {
    repo: &'a ProjectionRepository<S>,
    _marker: PhantomData<M>,
}

impl<'a, S: KeyValueStore, M: ReadModel> ReadModelRepository<'a, S, M> {
    pub fn new(repo: &'a ProjectionRepository<S>) -> Self {
        Self {
            repo,
            _marker: PhantomData,
        }
    }

    /// Get a read model by ID.
    pub fn get(&self, id: &str) -> Result<Option<Versioned<M>>, ProjectionError> {
        let projection = self.repo.get(M::COLLECTION, Some(id))?;
        match projection.action() {
            Action::None => Ok(None),
            _ => self.decode(projection).map(Some),
        }
    }

    /// Read models inside the `options` window, in scan order.
    pub fn find(&self, options: QueryOptions) -> Result<Vec<Versioned<M>>, ProjectionError> {
        self.repo
            .find(M::COLLECTION, options)?
            .into_iter()
            .map(|projection| self.decode(projection))
            .collect()
    }

    /// Any one stored read model.
    pub fn find_one(&self) -> Result<Option<Versioned<M>>, ProjectionError> {
        self.repo
            .find_one(M::COLLECTION)?
            .map(|projection| self.decode(projection))
            .transpose()
    }

    /// Store a new read model. Fails with a conflict if the id is taken.
    pub fn insert(&self, model: &M) -> Result<Versioned<M>, ProjectionError> {
        let record = self.encode(model)?;
        self.write(Projection::new(M::COLLECTION, record, Action::Create), model)
    }

    /// Overwrite a read model, provided it is still at `current.version`.
    pub fn update(&self, current: &Versioned<M>) -> Result<Versioned<M>, ProjectionError> {
        let mut record = self.encode(&current.data)?;
        record.set_version(Some(current.version.clone()));
        self.write(
            Projection::new(M::COLLECTION, record, Action::Update),
            &current.data,
        )
    }

    /// Delete a read model by ID.
    pub fn delete(&self, id: &str) -> Result<(), ProjectionError> {
        let mut projection = Projection::new(M::COLLECTION, Record::new(id), Action::Delete);
        self.repo.commit(&mut projection)
    }

    fn encode(&self, model: &M) -> Result<Record, ProjectionError> {
        let id = model.id();
        Record::from_data(id.as_str(), model).map_err(|err| {
            ProjectionError::serialization(&self.repo.keyspace().record_key(M::COLLECTION, &id), err)
        })
    }

    fn decode(&self, projection: Projection) -> Result<Versioned<M>, ProjectionError> {
        let data = projection.record().to_data::<M>().map_err(|err| {
            ProjectionError::serialization(
                &self.repo.keyspace().record_key(M::COLLECTION, projection.id()),
                err,
            )
        })?;
        Ok(Versioned {
            data,
            version: projection.version().unwrap_or_default().to_string(),
        })
    }

    fn write(&self, mut projection: Projection, model: &M) -> Result<Versioned<M>, ProjectionError> {
        self.repo.commit(&mut projection)?;
        Ok(Versioned {
            data: model.clone(),
            version: projection.version().unwrap_or_default().to_string(),
        })
    }
}

/// Extension trait for typed read model access on a projection repository.
pub trait ReadModelsExt<S> {
    /// Get a typed read model repository.
    fn read_models<M: ReadModel>(&self) -> ReadModelRepository<'_, S, M>;
}

impl<S: KeyValueStore> ReadModelsExt<S> for ProjectionRepository<S> {
    fn read_models<M: ReadModel>(&self) -> ReadModelRepository<'_, S, M> {
        ReadModelRepository::new(self)
    }
}
