//! Per-chain query options.

use super::condition::Predicate;
use crate::value::Value;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl Order {
    /// SQL keyword.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

/// Options accumulated by one fluent query chain.
///
/// Owned by a single chain and consumed by its terminal operation; never
/// shared between chains.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryState {
    /// Table name overriding the entity's table.
    pub table_override: Option<String>,
    /// WHERE conditions.
    pub predicate: Predicate,
    /// Maximum number of rows.
    pub limit: Option<u64>,
    /// Rows to skip.
    pub offset: Option<u64>,
    /// ORDER BY terms, by field or column name.
    pub order_by: Vec<(String, Order)>,
    /// Columns to select, by field or column name. `None` selects all.
    pub projection: Option<Vec<String>>,
}

impl QueryState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if any option that only makes sense for SELECT is set.
    pub(crate) fn has_select_options(&self) -> bool {
        self.limit.is_some()
            || self.offset.is_some()
            || !self.order_by.is_empty()
            || self.projection.is_some()
    }
}

/// Ordered column assignments for a partial update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignments {
    entries: Vec<(String, Value)>,
}

impl Assignments {
    /// Create an empty set of assignments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `value` to a field or column. A later assignment to the same
    /// name replaces the earlier one.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name.into(), value.into());
        self
    }

    fn push(&mut self, name: String, value: Value) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Assignments in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of assignments.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Assignments {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut out = Assignments::new();
        for (k, v) in iter {
            out.push(k.into(), v.into());
        }
        out
    }
}
