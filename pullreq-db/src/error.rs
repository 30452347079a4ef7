//! Error types for database operations

use pullreq_core::StoreError;
use thiserror::Error;

/// Database error types
#[derive(Error, Debug)]
pub enum Error {
    /// SQLx database error
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value could not be mapped back into the domain model
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias for database operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for StoreError {
    fn from(err: Error) -> Self {
        StoreError::backend(err)
    }
}

/// Whether `err` reports a UNIQUE or PRIMARY KEY violation
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_to_backend_store_error() {
        let err: StoreError = Error::InvalidData("status 'closed'".to_string()).into();
        assert!(matches!(err, StoreError::Backend(_)));
        assert_eq!(err.to_string(), "Storage error: Invalid data: status 'closed'");
    }

    #[test]
    fn test_row_not_found_is_not_unique_violation() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
