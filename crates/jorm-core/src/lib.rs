//! jorm core - entity metadata, statement building, execution, and migration.
//!
//! This crate holds everything the mapping engine needs except a concrete
//! database driver. Drivers plug in through the [`Driver`] trait; the `jorm`
//! crate ships the SQLite one and the fluent query façade.

mod macros;

pub mod catalog;
pub mod driver;
pub mod error;
pub mod migration;
pub mod query;
pub mod value;

pub use catalog::{
    ColumnKind, ColumnMeta, Directives, Entity, EntityMetadata, EntitySchema, FieldDef,
    MappingError, Registry,
};
pub use driver::{DriverError, Driver, ExecOutcome, Row};
pub use error::{Error, ErrorKind, Result};
pub use migration::{MigrationError, MigrationOp, MigrationPlan, MigrationReport, Migrator};
pub use query::{
    Assignments, BoundStatement, Dialect, Executor, Operation, Order, Predicate, QueryState,
    StatementBuilder,
};
pub use value::{CoerceError, SqlType, Value};
