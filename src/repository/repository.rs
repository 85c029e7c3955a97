use crate::error::ProjectionError;
use crate::reader::QueryOptions;
use crate::record::Projection;

/// Load one projection, allocating a fresh id when none is given.
pub trait Get {
    fn get(&self, collection: &str, id: Option<&str>) -> Result<Projection, ProjectionError>;
}

/// Load every projection of a collection inside a position window.
pub trait Find {
    fn find(
        &self,
        collection: &str,
        options: QueryOptions,
    ) -> Result<Vec<Projection>, ProjectionError>;
}

/// Load any one projection of a collection.
pub trait FindOne {
    fn find_one(&self, collection: &str) -> Result<Option<Projection>, ProjectionError>;
}

/// Apply a projection's pending action.
pub trait Commit {
    fn commit(&self, projection: &mut Projection) -> Result<(), ProjectionError>;
}

/// Bulk removal of stored projections.
pub trait Clear {
    /// Delete every record of `collection`. Returns how many keys were removed.
    fn clear(&self, collection: &str) -> Result<usize, ProjectionError>;

    /// Delete the records and id counters of every registered collection.
    fn clear_all(&self) -> Result<(), ProjectionError>;
}

/// Full repository trait combining all capabilities.
pub trait Repository: Get + Find + FindOne + Commit + Clear {}

// Blanket implementation: anything implementing all traits is a Repository
impl<T> Repository for T where T: Get + Find + FindOne + Commit + Clear {}
