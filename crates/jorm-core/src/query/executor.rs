//! Statement execution and row marshaling.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::statement::{BoundStatement, Operation};
use crate::catalog::{Entity, EntityMetadata};
use crate::driver::{Driver, ExecOutcome, Row};
use crate::error::{Error, Result};
use crate::value::{SqlType, Value};

/// Default threshold above which a statement is logged as slow.
pub const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_millis(200);

/// Runs bound statements on a driver.
///
/// Driver failures come back as [`Error::Storage`] with the SQL attached.
/// Nothing is retried.
#[derive(Clone, Copy)]
pub struct Executor<'a> {
    driver: &'a dyn Driver,
    slow_threshold: Duration,
}

impl<'a> Executor<'a> {
    /// Create an executor over `driver`.
    pub fn new(driver: &'a dyn Driver) -> Self {
        Self {
            driver,
            slow_threshold: DEFAULT_SLOW_THRESHOLD,
        }
    }

    /// Set the slow statement threshold.
    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = threshold;
        self
    }

    /// Run a statement that returns no rows.
    pub fn execute(&self, stmt: &BoundStatement, op: Operation) -> Result<ExecOutcome> {
        let start = Instant::now();
        let outcome = self
            .driver
            .execute(&stmt.sql, &stmt.args)
            .map_err(|e| Error::storage(&stmt.sql, e))?;
        self.log(op, stmt, outcome.rows_affected, start.elapsed());
        Ok(outcome)
    }

    /// Run a query and return its raw rows.
    pub fn query(&self, stmt: &BoundStatement, op: Operation) -> Result<Vec<Row>> {
        let start = Instant::now();
        let rows = self
            .driver
            .query(&stmt.sql, &stmt.args)
            .map_err(|e| Error::storage(&stmt.sql, e))?;
        self.log(op, stmt, rows.len() as u64, start.elapsed());
        Ok(rows)
    }

    /// Run a SELECT and marshal every row. No rows is an empty vector.
    pub fn fetch_all<T: Entity>(&self, meta: &EntityMetadata, stmt: &BoundStatement) -> Result<Vec<T>> {
        self.query(stmt, Operation::Select)?
            .into_iter()
            .map(|row| marshal(meta, row))
            .collect()
    }

    /// Run a SELECT against `table` and marshal the first row.
    ///
    /// No rows is [`Error::NotFound`] naming `table`, distinct from a storage
    /// failure.
    pub fn fetch_one<T: Entity>(
        &self,
        meta: &EntityMetadata,
        table: &str,
        stmt: &BoundStatement,
    ) -> Result<T> {
        match self.query(stmt, Operation::SelectOne)?.into_iter().next() {
            Some(row) => marshal(meta, row),
            None => Err(Error::NotFound {
                table: table.to_string(),
                sql: stmt.sql.clone(),
            }),
        }
    }

    /// Run a `SELECT COUNT(*)` and read the single integer back.
    pub fn count(&self, meta: &EntityMetadata, stmt: &BoundStatement) -> Result<u64> {
        let value = self
            .query(stmt, Operation::Count)?
            .into_iter()
            .next()
            .and_then(|row| row.into_pairs().next())
            .map(|(_, value)| value)
            .unwrap_or(Value::Int(0));

        let count = <i64 as SqlType>::from_value(value).map_err(|source| Error::Marshal {
            table: meta.table_name.clone(),
            column: "COUNT(*)".to_string(),
            source,
        })?;
        Ok(count.max(0) as u64)
    }

    /// Run an INSERT and write a store-generated key back into `entity`.
    ///
    /// The primary key field is the only part of `entity` this touches.
    pub fn insert<T: Entity>(
        &self,
        meta: &EntityMetadata,
        stmt: &BoundStatement,
        entity: &mut T,
    ) -> Result<ExecOutcome> {
        let outcome = self.execute(stmt, Operation::Insert)?;

        if let (true, Some(pk), Some(id)) =
            (meta.auto_increment, meta.primary_key(), outcome.last_insert_id)
        {
            entity
                .set(&pk.field_name, Value::Int(id))
                .map_err(|source| Error::Marshal {
                    table: meta.table_name.clone(),
                    column: pk.column_name.clone(),
                    source,
                })?;
        }

        Ok(outcome)
    }

    fn log(&self, op: Operation, stmt: &BoundStatement, rows: u64, elapsed: Duration) {
        let elapsed_us = elapsed.as_micros() as u64;
        if elapsed >= self.slow_threshold {
            warn!(
                op = %op,
                sql = %stmt.sql,
                args = stmt.args.len(),
                rows,
                elapsed_us,
                "Slow statement"
            );
        } else {
            debug!(
                op = %op,
                sql = %stmt.sql,
                args = stmt.args.len(),
                rows,
                elapsed_us,
                "Statement executed"
            );
        }
    }
}

/// Fill a fresh `T` from `row`, matching result columns to mapped columns by
/// name. Result columns with no mapped counterpart are ignored; mapped fields
/// absent from the row keep their default.
pub fn marshal<T: Entity>(meta: &EntityMetadata, row: Row) -> Result<T> {
    let mut entity = T::default();
    for (name, value) in row.into_pairs() {
        let Some(column) = meta.column_named(&name) else {
            continue;
        };
        entity
            .set(&column.field_name, value)
            .map_err(|source| Error::Marshal {
                table: meta.table_name.clone(),
                column: column.column_name.clone(),
                source,
            })?;
    }
    Ok(entity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Registry;
    use crate::driver::DriverError;
    use crate::query::Dialect;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Default, PartialEq)]
    struct User {
        id: i64,
        name: String,
        age: i32,
    }

    crate::impl_entity! {
        User {
            id: i64 => "primaryKey;autoIncrement",
            name: String,
            age: i32,
        }
    }

    /// Replays canned rows and records what it was asked to run.
    #[derive(Default)]
    struct ScriptedDriver {
        rows: Vec<Row>,
        outcome: ExecOutcome,
        fail: bool,
        seen: Mutex<Vec<String>>,
    }

    impl Driver for ScriptedDriver {
        fn dialect(&self) -> Dialect {
            Dialect::Sqlite
        }

        fn execute(&self, sql: &str, _args: &[Value]) -> std::result::Result<ExecOutcome, DriverError> {
            self.seen.lock().push(sql.to_string());
            if self.fail {
                return Err("disk I/O error".into());
            }
            Ok(self.outcome)
        }

        fn query(&self, sql: &str, _args: &[Value]) -> std::result::Result<Vec<Row>, DriverError> {
            self.seen.lock().push(sql.to_string());
            if self.fail {
                return Err("disk I/O error".into());
            }
            Ok(self.rows.clone())
        }

        fn table_columns(&self, _table: &str) -> std::result::Result<Option<Vec<String>>, DriverError> {
            Ok(None)
        }
    }

    fn row(values: Vec<Value>) -> Row {
        let columns: Arc<[String]> = vec!["id".to_string(), "NAME".to_string(), "age".to_string()].into();
        Row::new(columns, values)
    }

    fn stmt() -> BoundStatement {
        BoundStatement::new("SELECT ...", Vec::new())
    }

    #[test]
    fn test_fetch_all_marshals_with_coercion() {
        let driver = ScriptedDriver {
            rows: vec![
                row(vec![Value::Int(1), Value::Text("a".into()), Value::Text("30".into())]),
                row(vec![Value::Int(2), Value::Text("b".into()), Value::Int(40)]),
            ],
            ..Default::default()
        };
        let meta = Registry::new().resolve::<User>().unwrap();

        let users: Vec<User> = Executor::new(&driver).fetch_all(&meta, &stmt()).unwrap();
        assert_eq!(
            users,
            vec![
                User {
                    id: 1,
                    name: "a".into(),
                    age: 30
                },
                User {
                    id: 2,
                    name: "b".into(),
                    age: 40
                },
            ]
        );
    }

    #[test]
    fn test_fetch_one_not_found() {
        let driver = ScriptedDriver::default();
        let meta = Registry::new().resolve::<User>().unwrap();

        let err = Executor::new(&driver).fetch_one::<User>(&meta, "users", &stmt()).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "record not found in users");

        match Executor::new(&driver).fetch_one::<User>(&meta, "users_archive", &stmt()).unwrap_err() {
            Error::NotFound { table, sql } => {
                assert_eq!(table, "users_archive");
                assert_eq!(sql, "SELECT ...");
            }
            other => panic!("Expected NotFound error, got {other:?}"),
        }

        let all: Vec<User> = Executor::new(&driver).fetch_all(&meta, &stmt()).unwrap();
        assert!(all.is_empty());
    }

    #[test]
    fn test_marshal_error_names_column() {
        let driver = ScriptedDriver {
            rows: vec![row(vec![Value::Int(1), Value::Text("a".into()), Value::Text("old".into())])],
            ..Default::default()
        };
        let meta = Registry::new().resolve::<User>().unwrap();

        match Executor::new(&driver).fetch_one::<User>(&meta, "users", &stmt()).unwrap_err() {
            Error::Marshal { table, column, .. } => {
                assert_eq!(table, "users");
                assert_eq!(column, "age");
            }
            other => panic!("Expected Marshal error, got {other:?}"),
        }
    }

    #[test]
    fn test_storage_error_wraps_driver() {
        let driver = ScriptedDriver {
            fail: true,
            ..Default::default()
        };
        let meta = Registry::new().resolve::<User>().unwrap();

        match Executor::new(&driver).fetch_all::<User>(&meta, &stmt()).unwrap_err() {
            Error::Storage { sql, source } => {
                assert_eq!(sql, "SELECT ...");
                assert_eq!(source.to_string(), "disk I/O error");
            }
            other => panic!("Expected Storage error, got {other:?}"),
        }
    }

    #[test]
    fn test_insert_writes_back_key() {
        let driver = ScriptedDriver {
            outcome: ExecOutcome {
                rows_affected: 1,
                last_insert_id: Some(42),
            },
            ..Default::default()
        };
        let meta = Registry::new().resolve::<User>().unwrap();
        let mut user = User {
            id: 0,
            name: "a".into(),
            age: 1,
        };

        let outcome = Executor::new(&driver)
            .insert(&meta, &BoundStatement::new("INSERT ...", Vec::new()), &mut user)
            .unwrap();
        assert_eq!(outcome.rows_affected, 1);
        assert_eq!(user.id, 42);
        assert_eq!(driver.seen.lock().as_slice(), ["INSERT ...".to_string()]);
    }

    #[test]
    fn test_count() {
        let columns: Arc<[String]> = vec!["COUNT(*)".to_string()].into();
        let driver = ScriptedDriver {
            rows: vec![Row::new(columns, vec![Value::Int(7)])],
            ..Default::default()
        };
        let meta = Registry::new().resolve::<User>().unwrap();

        assert_eq!(Executor::new(&driver).count(&meta, &stmt()).unwrap(), 7);
    }
}
