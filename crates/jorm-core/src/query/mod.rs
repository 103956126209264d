//! Query construction and execution.
//!
//! A fluent chain fills a [`QueryState`]; [`StatementBuilder`] renders it
//! against an entity's metadata into a [`BoundStatement`]; [`Executor`] runs
//! that on a driver and marshals rows back into entities.

mod condition;
mod dialect;
mod executor;
mod state;
mod statement;

pub use condition::{count_placeholders, Clause, Predicate};
pub use dialect::Dialect;
pub use executor::{marshal, Executor, DEFAULT_SLOW_THRESHOLD};
pub use state::{Assignments, Order, QueryState};
pub use statement::{BoundStatement, Operation, StatementBuilder};
