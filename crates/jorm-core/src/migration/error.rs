//! Migration-specific error types.

use thiserror::Error;

use crate::driver::DriverError;

/// Migration errors.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The live schema of a table could not be read.
    #[error("cannot read live schema of {table}: {source}")]
    Introspect {
        /// Table being inspected.
        table: String,
        /// Driver error.
        #[source]
        source: DriverError,
    },

    /// A DDL statement failed. Statements before it stay applied.
    #[error("migration of {table} failed after {applied} statement(s) at `{sql}`: {source}")]
    StatementFailed {
        /// Table being migrated.
        table: String,
        /// Statement that failed.
        sql: String,
        /// Statements that were applied before the failure.
        applied: usize,
        /// Driver error.
        #[source]
        source: DriverError,
    },
}

impl MigrationError {
    /// Table the error concerns.
    pub fn table(&self) -> &str {
        match self {
            MigrationError::Introspect { table, .. } => table,
            MigrationError::StatementFailed { table, .. } => table,
        }
    }
}
