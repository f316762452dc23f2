//! Error types for catalog storage operations.

use thiserror::Error;

/// Errors that can occur while reading or writing the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataStoreError {
    /// A row with the same unique key already exists.
    #[error("Item already exists in data store")]
    AlreadyExists,
    /// A credit list named a row that does not exist.
    #[error("{field} references missing row {id}")]
    InvalidReference {
        /// The relation field that carried the bad id.
        field: &'static str,
        /// The id that did not resolve.
        id: i64,
    },
    /// An internal storage system error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for DataStoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DataStoreError::AlreadyExists
            }
            _ => DataStoreError::Internal(e.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DataStoreError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        DataStoreError::Internal(format!("migration failed: {}", e))
    }
}
