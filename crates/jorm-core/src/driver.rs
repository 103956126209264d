//! Driver boundary.
//!
//! The engine hands a driver SQL text plus an ordered argument list and gets
//! back rows or an affected-row count. Connection pooling, timeouts, and
//! transport belong to the driver.

use std::sync::Arc;

use crate::query::Dialect;
use crate::value::Value;

/// Error type drivers report. Kept opaque so the original error survives as
/// the `source()` of [`Error::Storage`](crate::Error::Storage).
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Outcome of a statement that does not return rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    /// Rows inserted, updated, or deleted.
    pub rows_affected: u64,
    /// Key generated by the last INSERT, when the store reports one.
    pub last_insert_id: Option<i64>,
}

/// One result row: column names shared across the result set, values per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    /// Create a row. `values` must line up with `columns`.
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values in column order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Value of the named column.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
            .map(|idx| &self.values[idx])
    }

    /// Consume into `(column, value)` pairs.
    pub fn into_pairs(self) -> impl Iterator<Item = (String, Value)> {
        let columns = self.columns;
        self.values
            .into_iter()
            .enumerate()
            .map(move |(idx, value)| (columns[idx].clone(), value))
    }
}

/// A database connection the engine can run statements on.
///
/// Calls block the invoking thread until the store answers.
pub trait Driver: Send + Sync {
    /// SQL dialect this connection speaks.
    fn dialect(&self) -> Dialect;

    /// Run a statement that returns no rows.
    fn execute(&self, sql: &str, args: &[Value]) -> Result<ExecOutcome, DriverError>;

    /// Run a statement and collect its rows.
    fn query(&self, sql: &str, args: &[Value]) -> Result<Vec<Row>, DriverError>;

    /// Column names of `table`, or `None` if the table does not exist.
    fn table_columns(&self, table: &str) -> Result<Option<Vec<String>>, DriverError>;

    /// Abort the statement currently running on this connection, if any.
    fn interrupt(&self) {}
}
