mod projection_repository;
mod repository;

pub use projection_repository::{ProjectionRepository, DEFAULT_SCAN_COUNT};
pub use repository::{Clear, Commit, Find, FindOne, Get, Repository};
