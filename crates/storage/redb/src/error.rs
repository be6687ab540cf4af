//! redb store error types.

use nomad_primitives::Address;
use nomad_storage::StoreError;

/// Errors from redb store operations.
#[derive(Debug, thiserror::Error)]
pub enum RedbStoreError {
    /// Database error.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("sequence overflow for {0}")]
    SequenceOverflow(Address),
}

impl From<postcard::Error> for RedbStoreError {
    fn from(err: postcard::Error) -> Self {
        RedbStoreError::Serialization(err.to_string())
    }
}

impl From<redb::DatabaseError> for RedbStoreError {
    fn from(err: redb::DatabaseError) -> Self {
        RedbStoreError::Database(err.to_string())
    }
}

impl From<redb::TransactionError> for RedbStoreError {
    fn from(err: redb::TransactionError) -> Self {
        RedbStoreError::Database(err.to_string())
    }
}

impl From<redb::TableError> for RedbStoreError {
    fn from(err: redb::TableError) -> Self {
        RedbStoreError::Database(err.to_string())
    }
}

impl From<redb::StorageError> for RedbStoreError {
    fn from(err: redb::StorageError) -> Self {
        RedbStoreError::Database(err.to_string())
    }
}

impl From<redb::CommitError> for RedbStoreError {
    fn from(err: redb::CommitError) -> Self {
        RedbStoreError::Database(err.to_string())
    }
}

impl From<RedbStoreError> for StoreError {
    fn from(err: RedbStoreError) -> Self {
        match err {
            RedbStoreError::Database(msg) => StoreError::Database(msg),
            RedbStoreError::Serialization(msg) => StoreError::Serialization(msg),
            RedbStoreError::SequenceOverflow(address) => StoreError::SequenceOverflow(address),
        }
    }
}
