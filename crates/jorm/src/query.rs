//! Fluent query builder.

use std::marker::PhantomData;

use chrono::Utc;

use jorm_core::{
    Assignments, BoundStatement, Entity, Operation, Order, QueryState, Result, StatementBuilder,
    Value,
};

use crate::engine::Engine;

/// One fluent query chain over entity `T`.
///
/// Each builder call consumes the chain and returns it, and each terminal
/// call consumes it for good, so a chain's state is never shared.
///
/// ```ignore
/// let adults = engine
///     .model::<User>()
///     .filter("age >= ?", jorm::args![18])
///     .order_by("name", Order::Asc)
///     .limit(10)
///     .find_all()?;
/// ```
#[must_use = "a query does nothing until a terminal method such as `find_all` runs it"]
pub struct Query<'e, T: Entity> {
    engine: &'e Engine,
    state: QueryState,
    _entity: PhantomData<fn() -> T>,
}

impl<'e, T: Entity> Query<'e, T> {
    pub(crate) fn new(engine: &'e Engine) -> Self {
        Self {
            engine,
            state: QueryState::new(),
            _entity: PhantomData,
        }
    }

    /// Run against `name` instead of the entity's table.
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.state.table_override = Some(name.into());
        self
    }

    /// Add a WHERE clause with `?` placeholders. Clauses combine with AND in
    /// call order.
    pub fn filter(mut self, fragment: impl Into<String>, args: Vec<Value>) -> Self {
        self.state.predicate.and(fragment, args);
        self
    }

    /// Return at most `n` rows. The last call wins.
    pub fn limit(mut self, n: u64) -> Self {
        self.state.limit = Some(n);
        self
    }

    /// Skip the first `n` rows.
    pub fn offset(mut self, n: u64) -> Self {
        self.state.offset = Some(n);
        self
    }

    /// Sort by a field or column.
    pub fn order_by(mut self, column: impl Into<String>, order: Order) -> Self {
        self.state.order_by.push((column.into(), order));
        self
    }

    /// Fetch only the named fields or columns. The rest keep their defaults.
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.projection = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Accumulated state.
    pub fn state(&self) -> &QueryState {
        &self.state
    }

    /// Render the statement `op` would run, without running it.
    pub fn to_statement(&self, op: Operation) -> Result<BoundStatement> {
        let meta = self.engine.metadata::<T>()?;
        StatementBuilder::new(&meta, self.engine.dialect()).build(op, &self.state)
    }

    /// Fetch one row. No match is [`Error::NotFound`](jorm_core::Error::NotFound)
    /// naming the table that was queried.
    pub fn find(self) -> Result<T> {
        let meta = self.engine.metadata::<T>()?;
        let builder = StatementBuilder::new(&meta, self.engine.dialect());
        let stmt = builder.select(&self.state, true)?;
        self.engine
            .executor()
            .fetch_one(&meta, builder.table_name(&self.state), &stmt)
    }

    /// Same as [`find`](Query::find).
    pub fn first(self) -> Result<T> {
        self.find()
    }

    /// Fetch every matching row. No match is an empty vector.
    pub fn find_all(mut self) -> Result<Vec<T>> {
        if self.state.limit.is_none() {
            self.state.limit = self.engine.config().max_rows;
        }
        let meta = self.engine.metadata::<T>()?;
        let stmt = StatementBuilder::new(&meta, self.engine.dialect()).select(&self.state, false)?;
        self.engine.executor().fetch_all(&meta, &stmt)
    }

    /// Count matching rows.
    pub fn count(self) -> Result<u64> {
        let meta = self.engine.metadata::<T>()?;
        let stmt = StatementBuilder::new(&meta, self.engine.dialect()).count(&self.state)?;
        self.engine.executor().count(&meta, &stmt)
    }

    /// Insert `entity`. Returns rows affected.
    ///
    /// When the primary key is store-generated, the new key is written into
    /// `entity`. No other field is modified.
    pub fn create(self, entity: &mut T) -> Result<u64> {
        let meta = self.engine.metadata::<T>()?;
        let stmt =
            StatementBuilder::new(&meta, self.engine.dialect()).insert(&self.state, entity, Utc::now())?;
        Ok(self.engine.executor().insert(&meta, &stmt, entity)?.rows_affected)
    }

    /// Write every updatable field of `entity` to the matching rows. Returns
    /// rows affected.
    ///
    /// Without a `filter`, every row in the table is updated.
    pub fn update(self, entity: &T) -> Result<u64> {
        let meta = self.engine.metadata::<T>()?;
        let stmt =
            StatementBuilder::new(&meta, self.engine.dialect()).update(&self.state, entity, Utc::now())?;
        Ok(self.engine.executor().execute(&stmt, Operation::Update)?.rows_affected)
    }

    /// Write only the given fields to the matching rows. Returns rows
    /// affected.
    ///
    /// Without a `filter`, every row in the table is updated.
    pub fn update_columns(self, assignments: Assignments) -> Result<u64> {
        let meta = self.engine.metadata::<T>()?;
        let stmt = StatementBuilder::new(&meta, self.engine.dialect()).update_assignments(
            &self.state,
            &assignments,
            Utc::now(),
        )?;
        Ok(self.engine.executor().execute(&stmt, Operation::Update)?.rows_affected)
    }

    /// Delete the matching rows. Returns rows affected.
    ///
    /// Without a `filter`, every row in the table is deleted.
    pub fn delete(self) -> Result<u64> {
        let meta = self.engine.metadata::<T>()?;
        let stmt = StatementBuilder::new(&meta, self.engine.dialect()).delete(&self.state)?;
        Ok(self.engine.executor().execute(&stmt, Operation::Delete)?.rows_affected)
    }
}
