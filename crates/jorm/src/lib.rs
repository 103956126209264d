//! jorm - a lightweight object-relational mapper.
//!
//! Entities are plain structs described once with [`impl_entity!`]. The
//! engine derives table and column metadata from that description, builds
//! parameterized SQL from fluent chains, marshals rows back into structs,
//! and keeps tables in step with [`Engine::auto_migrate`].
//!
//! # Example
//!
//! ```ignore
//! use jorm::{Engine, Order};
//!
//! #[derive(Debug, Default)]
//! struct User {
//!     id: i64,
//!     name: String,
//!     age: i32,
//! }
//!
//! jorm::impl_entity! {
//!     User {
//!         id: i64 => "primaryKey;autoIncrement",
//!         name: String,
//!         age: i32,
//!     }
//! }
//!
//! let engine = Engine::open("sqlite3", "test.db", None)?;
//! engine.auto_migrate::<User>()?;
//!
//! let mut user = User { name: "a".into(), age: 1, ..Default::default() };
//! engine.model::<User>().create(&mut user)?;
//!
//! let found = engine.model::<User>().filter("id = ?", jorm::args![user.id]).find()?;
//! ```

pub mod config;
pub mod engine;
pub mod query;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use config::EngineConfig;
pub use engine::{Engine, InterruptHandle};
pub use query::Query;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDriver;

pub use jorm_core::{args, impl_entity};
pub use jorm_core::{catalog, driver, migration, value};
pub use jorm_core::{
    Assignments, BoundStatement, CoerceError, ColumnKind, ColumnMeta, Dialect, Driver,
    DriverError, Entity, EntityMetadata, EntitySchema, Error, ErrorKind, ExecOutcome, FieldDef,
    MappingError, MigrationError, MigrationPlan, MigrationReport, Operation, Order, Registry,
    Result, Row, SqlType, Value,
};
