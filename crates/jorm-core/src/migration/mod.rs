//! Additive schema migration.
//!
//! The migrator compares an entity's metadata with the live table and
//! converges them by creating the table or adding missing columns. It never
//! drops, renames, or retypes anything, so running it twice is a no-op the
//! second time.
//!
//! # Example
//!
//! ```ignore
//! let migrator = Migrator::new(&driver);
//! let plan = migrator.plan(&meta)?;
//! for sql in plan.statements(Dialect::Sqlite) {
//!     println!("{sql};");
//! }
//! let report = migrator.apply(&plan)?;
//! ```

pub mod diff;
pub mod error;
pub mod executor;
pub mod plan;

pub use diff::SchemaDiff;
pub use error::MigrationError;
pub use executor::{MigrationReport, Migrator};
pub use plan::{column_definition, MigrationOp, MigrationPlan};
