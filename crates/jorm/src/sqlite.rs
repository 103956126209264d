//! Bundled SQLite driver.
//!
//! Wraps a single `rusqlite` connection behind a mutex. Statements are
//! prepared through the connection's statement cache, so repeated fluent
//! queries of the same shape skip re-parsing.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::types::{ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, InterruptHandle, ToSql};
use tracing::debug;

use jorm_core::driver::{Driver, DriverError, ExecOutcome, Row};
use jorm_core::{Dialect, Value};

use crate::config::DEFAULT_BUSY_TIMEOUT;

/// SQLite connection implementing [`Driver`].
pub struct SqliteDriver {
    conn: Mutex<Connection>,
    interrupt: InterruptHandle,
}

impl SqliteDriver {
    /// Open (or create) a database file with the default busy timeout.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, rusqlite::Error> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Open (or create) a database file.
    ///
    /// `":memory:"` opens a private in-memory database.
    pub fn open_with_timeout(
        path: impl AsRef<Path>,
        busy_timeout: Duration,
    ) -> Result<Self, rusqlite::Error> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Opening SQLite database");
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        Ok(Self::from_connection(conn))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    /// Wrap an already opened connection.
    pub fn from_connection(conn: Connection) -> Self {
        let interrupt = conn.get_interrupt_handle();
        Self {
            conn: Mutex::new(conn),
            interrupt,
        }
    }
}

/// Borrowed [`Value`] bound as a statement parameter.
struct Bind<'a>(&'a Value);

impl ToSql for Bind<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Bool(b) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*b))),
            Value::Int(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Value::Float(f) => ToSqlOutput::Owned(SqlValue::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Bytes(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b.as_slice())),
            // RFC 3339 text sorts chronologically for a fixed offset.
            Value::Timestamp(t) => ToSqlOutput::Owned(SqlValue::Text(t.to_rfc3339())),
        })
    }
}

fn read_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
            Ok(s) => Value::Text(s.to_string()),
            Err(_) => Value::Bytes(bytes.to_vec()),
        },
        ValueRef::Blob(bytes) => Value::Bytes(bytes.to_vec()),
    }
}

fn is_insert(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .is_some_and(|verb| verb.eq_ignore_ascii_case("INSERT"))
}

impl Driver for SqliteDriver {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn execute(&self, sql: &str, args: &[Value]) -> Result<ExecOutcome, DriverError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(sql)?;
        let rows_affected = stmt.execute(params_from_iter(args.iter().map(Bind)))?;
        drop(stmt);

        Ok(ExecOutcome {
            rows_affected: rows_affected as u64,
            last_insert_id: is_insert(sql).then(|| conn.last_insert_rowid()),
        })
    }

    fn query(&self, sql: &str, args: &[Value]) -> Result<Vec<Row>, DriverError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(sql)?;
        let columns: Arc<[String]> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query(params_from_iter(args.iter().map(Bind)))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for idx in 0..columns.len() {
                values.push(read_value(row.get_ref(idx)?));
            }
            out.push(Row::new(Arc::clone(&columns), values));
        }
        Ok(out)
    }

    fn table_columns(&self, table: &str) -> Result<Option<Vec<String>>, DriverError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached("SELECT name FROM pragma_table_info(?1)")?;
        let names = stmt
            .query_map([table], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(if names.is_empty() { None } else { Some(names) })
    }

    fn interrupt(&self) {
        self.interrupt.interrupt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_execute_and_query() {
        let driver = SqliteDriver::open_in_memory().unwrap();
        driver
            .execute("CREATE TABLE t (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT, at DATETIME)", &[])
            .unwrap();

        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let outcome = driver
            .execute(
                "INSERT INTO t (name, at) VALUES (?, ?)",
                &[Value::Text("a".into()), Value::Timestamp(at)],
            )
            .unwrap();
        assert_eq!(outcome.rows_affected, 1);
        assert_eq!(outcome.last_insert_id, Some(1));

        let rows = driver
            .query("SELECT id, name, at FROM t WHERE id = ?", &[Value::Int(1)])
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].columns(), ["id", "name", "at"]);
        assert_eq!(rows[0].get("name"), Some(&Value::Text("a".into())));
        assert_eq!(rows[0].get("at"), Some(&Value::Text(at.to_rfc3339())));

        let update = driver
            .execute("UPDATE t SET name = ?", &[Value::Text("b".into())])
            .unwrap();
        assert_eq!(update.last_insert_id, None);
    }

    #[test]
    fn test_table_columns() {
        let driver = SqliteDriver::open_in_memory().unwrap();
        assert_eq!(driver.table_columns("users").unwrap(), None);

        driver.execute("CREATE TABLE users (id INTEGER, Name TEXT)", &[]).unwrap();
        assert_eq!(
            driver.table_columns("users").unwrap(),
            Some(vec!["id".to_string(), "Name".to_string()])
        );
    }

    #[test]
    fn test_errors_keep_rusqlite_source() {
        let driver = SqliteDriver::open_in_memory().unwrap();
        let err = driver.query("SELECT * FROM missing", &[]).unwrap_err();
        assert!(err.downcast_ref::<rusqlite::Error>().is_some());
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_is_insert() {
        assert!(is_insert("  insert into t values (1)"));
        assert!(!is_insert("UPDATE t SET a = 1"));
        assert!(!is_insert("INS"));
    }
}
