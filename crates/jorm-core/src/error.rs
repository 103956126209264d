//! Core error types.

use thiserror::Error;

use crate::catalog::MappingError;
use crate::driver::DriverError;
use crate::migration::MigrationError;
use crate::value::CoerceError;

/// Result alias used across jorm.
pub type Result<T> = std::result::Result<T, Error>;

/// Engine errors.
///
/// Nothing is retried internally. Each variant carries the table, column, or
/// SQL text needed to diagnose it.
#[derive(Debug, Error)]
pub enum Error {
    /// Entity declaration cannot be mapped.
    #[error("mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// Invalid combination of query options.
    #[error("query error: {0}")]
    Query(String),

    /// The driver rejected a statement or the connection failed.
    #[error("storage error executing `{sql}`: {source}")]
    Storage {
        /// Statement that failed.
        sql: String,
        /// Original driver error.
        #[source]
        source: DriverError,
    },

    /// A single-row fetch matched nothing.
    #[error("record not found in {table}")]
    NotFound {
        /// Table that was queried.
        table: String,
        /// Statement that returned no rows.
        sql: String,
    },

    /// A row value could not be coerced into its field.
    #[error("cannot marshal {table}.{column}: {source}")]
    Marshal {
        /// Table the row came from.
        table: String,
        /// Offending column.
        column: String,
        /// Coercion failure.
        #[source]
        source: CoerceError,
    },

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] MigrationError),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`Error::Mapping`].
    Mapping,
    /// See [`Error::Query`].
    Query,
    /// See [`Error::Storage`].
    Storage,
    /// See [`Error::NotFound`].
    NotFound,
    /// See [`Error::Marshal`].
    Marshal,
    /// See [`Error::Migration`].
    Migration,
}

impl Error {
    /// Create a query error.
    pub fn query(message: impl Into<String>) -> Self {
        Error::Query(message.into())
    }

    /// Wrap a driver error with the statement that caused it.
    pub fn storage(sql: impl Into<String>, source: impl Into<DriverError>) -> Self {
        Error::Storage {
            sql: sql.into(),
            source: source.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Mapping(_) => ErrorKind::Mapping,
            Error::Query(_) => ErrorKind::Query,
            Error::Storage { .. } => ErrorKind::Storage,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Marshal { .. } => ErrorKind::Marshal,
            Error::Migration(_) => ErrorKind::Migration,
        }
    }

    /// Check if a single-row fetch came back empty.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}
