//! Error taxonomy for the persistence gateway.

use thiserror::Error;

/// Errors surfaced by [`Storage`](super::Storage) operations.
///
/// Lookups that find nothing are not errors; they return `Option` or an
/// empty collection instead. Failed writes never commit.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A field constraint was violated; rejected before any row was touched
    #[error("invalid {field}: {reason}")]
    Validation {
        field: &'static str,
        reason: String,
    },

    /// A write referenced a runner row that could not be resolved
    #[error("integrity violation: {0}")]
    Integrity(String),

    /// A stored value could not be decoded into the model
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// Underlying SQLite failure
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}
