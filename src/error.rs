use std::fmt;

use crate::store::StoreError;

/// Why a create or update lost an optimistic-lock race.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    /// A create targeted an id that already holds a record.
    AlreadyExists,
    /// The persisted version moved on since the caller read the record.
    VersionMismatch { expected: String, actual: String },
    /// The watched key changed before the conditional write ran,
    /// or the store did not acknowledge the write.
    TransactionAborted,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictKind::AlreadyExists => write!(f, "record already exists"),
            ConflictKind::VersionMismatch { expected, actual } => write!(
                f,
                "expected version {}, found {}",
                expected, actual
            ),
            ConflictKind::TransactionAborted => write!(f, "conditional write aborted"),
        }
    }
}

/// Error type for projection repository operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProjectionError {
    /// Optimistic-lock violation. Safe to retry after re-reading the record.
    #[error("optimistic lock violation on {collection}:{id}: {kind}")]
    Conflict {
        collection: String,
        id: String,
        kind: ConflictKind,
    },
    /// The store client reported no live connection.
    #[error("store is not connected")]
    NotConnected,
    /// A stored payload could not be decoded, or a record could not be encoded.
    #[error("serialization error at {key}: {message}")]
    Serialization { key: String, message: String },
    /// Failure surfaced by the store client.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// `commit` was called on a projection with no declared action.
    #[error("no action declared for {collection}:{id}")]
    InvalidIntent { collection: String, id: String },
}

impl ProjectionError {
    /// True for optimistic-lock violations.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ProjectionError::Conflict { .. })
    }

    pub(crate) fn conflict(collection: &str, id: &str, kind: ConflictKind) -> Self {
        ProjectionError::Conflict {
            collection: collection.to_string(),
            id: id.to_string(),
            kind,
        }
    }

    pub(crate) fn serialization(key: &str, err: impl fmt::Display) -> Self {
        ProjectionError::Serialization {
            key: key.to_string(),
            message: err.to_string(),
        }
    }
}

/// Error type for configuration parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid connection url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
}
