//! Entity catalog for jorm.
//!
//! Entities describe themselves once through an [`EntitySchema`]; the
//! [`Registry`] introspects that description into immutable
//! [`EntityMetadata`] and caches it per Rust type.

mod directive;
mod entity;
mod error;
mod field;
mod introspect;
mod naming;
mod registry;
mod types;

pub use directive::Directives;
pub use entity::{Entity, EntityMetadata, EntitySchema};
pub use error::MappingError;
pub use field::{ColumnMeta, FieldDef};
pub use introspect::introspect;
pub use naming::{default_table_name, pluralize, snake_case};
pub use registry::Registry;
pub use types::ColumnKind;
