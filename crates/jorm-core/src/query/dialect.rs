//! SQL dialect differences: quoting, placeholders, DDL types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::condition::for_each_placeholder;
use crate::catalog::ColumnKind;

/// SQL flavour spoken by a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// SQLite 3.
    #[default]
    Sqlite,
    /// MySQL / MariaDB.
    Mysql,
    /// PostgreSQL.
    Postgres,
}

impl Dialect {
    /// Map a driver name as passed to `Engine::open`.
    pub fn from_driver_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Some(Dialect::Sqlite),
            "mysql" | "mariadb" => Some(Dialect::Mysql),
            "postgres" | "postgresql" | "pgx" | "pg" => Some(Dialect::Postgres),
            _ => None,
        }
    }

    /// Canonical driver name.
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite3",
            Dialect::Mysql => "mysql",
            Dialect::Postgres => "postgres",
        }
    }

    /// Quote an identifier, doubling any embedded quote character.
    pub fn quote_ident(&self, ident: &str) -> String {
        let q = match self {
            Dialect::Mysql => '`',
            Dialect::Sqlite | Dialect::Postgres => '"',
        };
        let mut out = String::with_capacity(ident.len() + 2);
        out.push(q);
        for c in ident.chars() {
            if c == q {
                out.push(q);
            }
            out.push(c);
        }
        out.push(q);
        out
    }

    /// Rewrite `?` placeholders into the dialect's native form.
    ///
    /// Only Postgres differs: placeholders become `$1`, `$2`, ... in order.
    /// Question marks inside quoted text or comments are left alone.
    pub fn render_placeholders(&self, sql: &str) -> String {
        if *self != Dialect::Postgres {
            return sql.to_string();
        }

        let mut positions = Vec::new();
        for_each_placeholder(sql, |idx| positions.push(idx));
        if positions.is_empty() {
            return sql.to_string();
        }

        let mut out = String::with_capacity(sql.len() + positions.len() * 2);
        let mut last = 0;
        for (n, pos) in positions.into_iter().enumerate() {
            out.push_str(&sql[last..pos]);
            out.push('$');
            out.push_str(&(n + 1).to_string());
            last = pos + 1;
        }
        out.push_str(&sql[last..]);
        out
    }

    /// Column type for a kind.
    pub fn column_type(&self, kind: ColumnKind) -> &'static str {
        match (self, kind) {
            (Dialect::Sqlite, ColumnKind::Integer) => "INTEGER",
            (Dialect::Sqlite, ColumnKind::Float) => "REAL",
            (Dialect::Sqlite, ColumnKind::Temporal) => "DATETIME",
            (Dialect::Sqlite, ColumnKind::Other) => "BLOB",

            (Dialect::Mysql, ColumnKind::Integer) => "BIGINT",
            (Dialect::Mysql, ColumnKind::Float) => "DOUBLE",
            (Dialect::Mysql, ColumnKind::Temporal) => "DATETIME",
            (Dialect::Mysql, ColumnKind::Other) => "BLOB",

            (Dialect::Postgres, ColumnKind::Integer) => "BIGINT",
            (Dialect::Postgres, ColumnKind::Float) => "DOUBLE PRECISION",
            (Dialect::Postgres, ColumnKind::Temporal) => "TIMESTAMPTZ",
            (Dialect::Postgres, ColumnKind::Other) => "BYTEA",

            (_, ColumnKind::Text) => "TEXT",
            (_, ColumnKind::Boolean) => "BOOLEAN",
        }
    }

    /// Full column definition for a store-generated integer primary key.
    pub fn auto_increment_column(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "INTEGER PRIMARY KEY AUTOINCREMENT",
            Dialect::Mysql => "BIGINT AUTO_INCREMENT PRIMARY KEY",
            Dialect::Postgres => "BIGSERIAL PRIMARY KEY",
        }
    }

    /// LIMIT clause meaning "no limit", for queries with only an OFFSET.
    pub fn unbounded_limit(&self) -> Option<&'static str> {
        match self {
            Dialect::Sqlite => Some("LIMIT -1"),
            Dialect::Mysql => Some("LIMIT 18446744073709551615"),
            Dialect::Postgres => None,
        }
    }

    /// Literal used as DEFAULT when adding a NOT NULL column to an existing
    /// table, so rows already present get a value.
    pub fn zero_default(&self, kind: ColumnKind) -> &'static str {
        match (self, kind) {
            (_, ColumnKind::Integer | ColumnKind::Float) => "0",
            (_, ColumnKind::Text) => "''",
            (Dialect::Sqlite, ColumnKind::Boolean) => "0",
            (_, ColumnKind::Boolean) => "FALSE",
            (Dialect::Mysql, ColumnKind::Temporal) => "'1970-01-01 00:00:00'",
            (_, ColumnKind::Temporal) => "'1970-01-01T00:00:00+00:00'",
            (Dialect::Sqlite, ColumnKind::Other) => "X''",
            (_, ColumnKind::Other) => "''",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
