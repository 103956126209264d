//! SQL rendering.
//!
//! [`StatementBuilder`] turns a [`QueryState`] plus an entity's metadata into
//! one [`BoundStatement`]. Identifiers are always quoted for the target
//! dialect; values only ever travel in the argument list.

use std::fmt;

use chrono::{DateTime, Utc};

use super::dialect::Dialect;
use super::state::{Assignments, QueryState};
use crate::catalog::{ColumnKind, ColumnMeta, Entity, EntityMetadata};
use crate::error::{Error, Result};
use crate::value::Value;

/// Kind of statement to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Multi-row SELECT.
    Select,
    /// SELECT constrained to one row.
    SelectOne,
    /// SELECT COUNT(*).
    Count,
    /// INSERT one entity.
    Insert,
    /// UPDATE matching rows.
    Update,
    /// DELETE matching rows.
    Delete,
    /// Caller-supplied SQL.
    Raw,
}

impl Operation {
    /// SQL verb, for logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Select | Operation::SelectOne | Operation::Count => "SELECT",
            Operation::Insert => "INSERT",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
            Operation::Raw => "RAW",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SQL text plus its ordered arguments. The unit handed to a driver.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    /// SQL text in the dialect's placeholder style.
    pub sql: String,
    /// Arguments, one per placeholder.
    pub args: Vec<Value>,
}

impl BoundStatement {
    /// Create a bound statement.
    pub fn new(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }
}

/// Largest LIMIT or OFFSET every dialect accepts as a signed 64-bit integer.
const MAX_ROW_BOUND: u64 = i64::MAX as u64;

/// Value written into an engine-stamped time column.
fn time_stamp(column: &ColumnMeta, now: DateTime<Utc>) -> Value {
    match column.kind {
        ColumnKind::Integer => Value::Int(now.timestamp()),
        _ => Value::Timestamp(now),
    }
}

/// Renders statements for one entity in one dialect.
#[derive(Debug, Clone, Copy)]
pub struct StatementBuilder<'a> {
    meta: &'a EntityMetadata,
    dialect: Dialect,
}

impl<'a> StatementBuilder<'a> {
    /// Create a builder.
    pub fn new(meta: &'a EntityMetadata, dialect: Dialect) -> Self {
        Self { meta, dialect }
    }

    /// Metadata the builder renders against.
    pub fn metadata(&self) -> &'a EntityMetadata {
        self.meta
    }

    /// Render a statement that needs no entity value: `Select`, `SelectOne`,
    /// `Count`, or `Delete`.
    pub fn build(&self, op: Operation, state: &QueryState) -> Result<BoundStatement> {
        match op {
            Operation::Select => self.select(state, false),
            Operation::SelectOne => self.select(state, true),
            Operation::Count => self.count(state),
            Operation::Delete => self.delete(state),
            Operation::Insert | Operation::Update => Err(Error::query(format!(
                "{op} on {} needs an entity value",
                self.meta.table_name
            ))),
            Operation::Raw => Err(Error::query("raw statements are not rendered from query state")),
        }
    }

    /// `SELECT <columns> FROM <table> [WHERE ..] [ORDER BY ..] [LIMIT ..] [OFFSET ..]`.
    ///
    /// With `single`, the effective limit is capped at 1 without touching
    /// `state`.
    pub fn select(&self, state: &QueryState, single: bool) -> Result<BoundStatement> {
        let columns = match &state.projection {
            Some(names) => {
                if names.is_empty() {
                    return Err(Error::query("empty column projection"));
                }
                names
                    .iter()
                    .map(|name| self.resolve_column(name).map(|c| self.quote(&c.column_name)))
                    .collect::<Result<Vec<_>>>()?
            }
            None => self.meta.columns.iter().map(|c| self.quote(&c.column_name)).collect(),
        };

        let mut sql = format!("SELECT {} FROM {}", columns.join(", "), self.table(state)?);
        let mut args = Vec::new();
        self.push_where(state, &mut sql, &mut args)?;

        if !state.order_by.is_empty() {
            let terms = state
                .order_by
                .iter()
                .map(|(name, order)| {
                    self.resolve_column(name)
                        .map(|c| format!("{} {}", self.quote(&c.column_name), order.as_sql()))
                })
                .collect::<Result<Vec<_>>>()?;
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }

        let limit = if single {
            Some(state.limit.map_or(1, |n| n.min(1)))
        } else {
            state.limit
        };
        for (option, n) in [("limit", limit), ("offset", state.offset)] {
            if n.is_some_and(|n| n > MAX_ROW_BOUND) {
                return Err(Error::query(format!(
                    "{option} on {} exceeds {MAX_ROW_BOUND}",
                    self.meta.table_name
                )));
            }
        }
        match (limit, state.offset) {
            (Some(n), Some(skip)) => sql.push_str(&format!(" LIMIT {n} OFFSET {skip}")),
            (Some(n), None) => sql.push_str(&format!(" LIMIT {n}")),
            (None, Some(skip)) => {
                if let Some(all) = self.dialect.unbounded_limit() {
                    sql.push(' ');
                    sql.push_str(all);
                }
                sql.push_str(&format!(" OFFSET {skip}"));
            }
            (None, None) => {}
        }

        Ok(self.finish(sql, args))
    }

    /// `SELECT COUNT(*) FROM <table> [WHERE ..]`.
    pub fn count(&self, state: &QueryState) -> Result<BoundStatement> {
        self.reject_select_options(Operation::Count, state)?;
        let mut sql = format!("SELECT COUNT(*) FROM {}", self.table(state)?);
        let mut args = Vec::new();
        self.push_where(state, &mut sql, &mut args)?;
        Ok(self.finish(sql, args))
    }

    /// `INSERT INTO <table> (..) VALUES (..)`.
    ///
    /// Store-generated columns are left out. `auto_time` and `auto_update`
    /// columns get `now` regardless of the entity's value.
    pub fn insert<T: Entity>(
        &self,
        state: &QueryState,
        entity: &T,
        now: DateTime<Utc>,
    ) -> Result<BoundStatement> {
        self.reject_select_options(Operation::Insert, state)?;
        if !state.predicate.is_empty() {
            return Err(Error::query(format!(
                "INSERT into {} does not take a where clause",
                self.meta.table_name
            )));
        }

        let mut columns = Vec::new();
        let mut args = Vec::new();
        for column in self.meta.insert_columns() {
            let value = if column.auto_time || column.auto_update {
                time_stamp(column, now)
            } else {
                self.field_value(entity, column)?
            };
            columns.push(self.quote(&column.column_name));
            args.push(value);
        }

        let table = self.table(state)?;
        let sql = if columns.is_empty() {
            match self.dialect {
                Dialect::Mysql => format!("INSERT INTO {table} () VALUES ()"),
                Dialect::Sqlite | Dialect::Postgres => format!("INSERT INTO {table} DEFAULT VALUES"),
            }
        } else {
            let marks = vec!["?"; columns.len()].join(", ");
            format!("INSERT INTO {table} ({}) VALUES ({marks})", columns.join(", "))
        };

        Ok(self.finish(sql, args))
    }

    /// `UPDATE <table> SET .. [WHERE ..]` writing every updatable column of
    /// `entity`.
    ///
    /// Without a where clause every row in the table is updated.
    pub fn update<T: Entity>(
        &self,
        state: &QueryState,
        entity: &T,
        now: DateTime<Utc>,
    ) -> Result<BoundStatement> {
        let mut sets = Vec::new();
        for column in self.meta.columns.iter().filter(|c| c.is_updatable()) {
            sets.push((column, self.field_value(entity, column)?));
        }
        self.render_update(state, sets, now)
    }

    /// `UPDATE <table> SET .. [WHERE ..]` from explicit assignments.
    ///
    /// Names resolve as field or column names. Assigning the primary key or
    /// a store-generated column is an error; values given for `auto_time`
    /// and `auto_update` columns are dropped.
    pub fn update_assignments(
        &self,
        state: &QueryState,
        assignments: &Assignments,
        now: DateTime<Utc>,
    ) -> Result<BoundStatement> {
        let mut sets: Vec<(&'a ColumnMeta, Value)> = Vec::with_capacity(assignments.len());
        for (name, value) in assignments.iter() {
            let column = self.resolve_column(name)?;
            if column.is_primary_key || column.is_auto_generated {
                return Err(Error::query(format!(
                    "cannot assign {}.{}: primary key and generated columns are read-only",
                    self.meta.table_name, column.column_name
                )));
            }
            if column.auto_time || column.auto_update {
                continue;
            }
            match sets.iter_mut().find(|(c, _)| c.column_name == column.column_name) {
                Some(entry) => entry.1 = value.clone(),
                None => sets.push((column, value.clone())),
            }
        }
        self.render_update(state, sets, now)
    }

    /// `DELETE FROM <table> [WHERE ..]`.
    ///
    /// Without a where clause every row in the table is deleted.
    pub fn delete(&self, state: &QueryState) -> Result<BoundStatement> {
        self.reject_select_options(Operation::Delete, state)?;
        let mut sql = format!("DELETE FROM {}", self.table(state)?);
        let mut args = Vec::new();
        self.push_where(state, &mut sql, &mut args)?;
        Ok(self.finish(sql, args))
    }

    fn render_update(
        &self,
        state: &QueryState,
        mut sets: Vec<(&'a ColumnMeta, Value)>,
        now: DateTime<Utc>,
    ) -> Result<BoundStatement> {
        self.reject_select_options(Operation::Update, state)?;

        for column in self.meta.columns.iter().filter(|c| c.auto_update) {
            sets.push((column, time_stamp(column, now)));
        }
        if sets.is_empty() {
            return Err(Error::query(format!(
                "UPDATE on {} has no columns to set",
                self.meta.table_name
            )));
        }

        let mut assigns = Vec::with_capacity(sets.len());
        let mut args = Vec::with_capacity(sets.len());
        for (column, value) in sets {
            assigns.push(format!("{} = ?", self.quote(&column.column_name)));
            args.push(value);
        }

        let mut sql = format!("UPDATE {} SET {}", self.table(state)?, assigns.join(", "));
        self.push_where(state, &mut sql, &mut args)?;
        Ok(self.finish(sql, args))
    }

    fn reject_select_options(&self, op: Operation, state: &QueryState) -> Result<()> {
        let mut conflicts = Vec::new();
        if state.limit.is_some() {
            conflicts.push("limit");
        }
        if state.offset.is_some() {
            conflicts.push("offset");
        }
        if !state.order_by.is_empty() {
            conflicts.push("order by");
        }
        if state.projection.is_some() {
            conflicts.push("select");
        }
        if conflicts.is_empty() {
            return Ok(());
        }
        let what = if op == Operation::Count { "COUNT" } else { op.as_str() };
        Err(Error::query(format!(
            "conflicting options for {what} on {}: {}",
            self.meta.table_name,
            conflicts.join(", ")
        )))
    }

    fn push_where(&self, state: &QueryState, sql: &mut String, args: &mut Vec<Value>) -> Result<()> {
        if let Some((clause, clause_args)) = state.predicate.render()? {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
            args.extend(clause_args);
        }
        Ok(())
    }

    /// Unquoted name of the table `state` targets.
    pub fn table_name<'s>(&'s self, state: &'s QueryState) -> &'s str {
        match state.table_override.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => &self.meta.table_name,
        }
    }

    fn table(&self, state: &QueryState) -> Result<String> {
        match state.table_override.as_deref().map(str::trim) {
            Some("") => Err(Error::query("empty table override")),
            Some(name) => Ok(self.quote(name)),
            None => Ok(self.quote(&self.meta.table_name)),
        }
    }

    fn resolve_column(&self, name: &str) -> Result<&'a ColumnMeta> {
        self.meta.column(name).ok_or_else(|| {
            Error::query(format!("unknown column `{name}` on {}", self.meta.table_name))
        })
    }

    fn field_value<T: Entity>(&self, entity: &T, column: &ColumnMeta) -> Result<Value> {
        entity.get(&column.field_name).ok_or_else(|| {
            Error::query(format!(
                "{} does not expose field {}",
                self.meta.type_name, column.field_name
            ))
        })
    }

    fn quote(&self, ident: &str) -> String {
        self.dialect.quote_ident(ident)
    }

    fn finish(&self, sql: String, args: Vec<Value>) -> BoundStatement {
        BoundStatement {
            sql: self.dialect.render_placeholders(&sql),
            args,
        }
    }
}
