//! Entity mapping errors.

use thiserror::Error;

use super::types::ColumnKind;

/// An entity declaration cannot be mapped to a table.
///
/// Mapping errors are never retried internally: the declaration has to be
/// fixed. Failed resolutions are not cached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// The entity declares no persistable fields.
    #[error("entity {entity} has no persistable fields")]
    NoFields {
        /// Entity type name.
        entity: String,
    },

    /// The same field is declared twice.
    #[error("entity {entity} declares field {field} more than once")]
    DuplicateField {
        /// Entity type name.
        entity: String,
        /// Field name.
        field: String,
    },

    /// Two fields map to the same column.
    #[error("entity {entity}: fields {first} and {second} both map to column {column}")]
    DuplicateColumn {
        /// Entity type name.
        entity: String,
        /// Column name.
        column: String,
        /// First field mapped to the column.
        first: String,
        /// Second field mapped to the column.
        second: String,
    },

    /// More than one field is marked primary key.
    #[error("entity {entity}: fields {first} and {second} are both marked primary key")]
    MultiplePrimaryKeys {
        /// Entity type name.
        entity: String,
        /// First primary key field.
        first: String,
        /// Second primary key field.
        second: String,
    },

    /// An auto-increment directive on a field that cannot carry it.
    #[error("entity {entity}: field {field} cannot auto-increment: {reason}")]
    InvalidAutoIncrement {
        /// Entity type name.
        entity: String,
        /// Field name.
        field: String,
        /// Why the directive is rejected.
        reason: &'static str,
    },

    /// An engine time stamp on a field that cannot hold one.
    #[error("entity {entity}: field {field} cannot be time-stamped: {kind:?} column")]
    InvalidTimeStamp {
        /// Entity type name.
        entity: String,
        /// Field name.
        field: String,
        /// Column kind of the field.
        kind: ColumnKind,
    },

    /// The resolved table name is blank.
    #[error("entity {entity} resolves to an empty table name")]
    EmptyTableName {
        /// Entity type name.
        entity: String,
    },
}

impl MappingError {
    /// Entity type name the error refers to.
    pub fn entity(&self) -> &str {
        match self {
            MappingError::NoFields { entity }
            | MappingError::DuplicateField { entity, .. }
            | MappingError::DuplicateColumn { entity, .. }
            | MappingError::MultiplePrimaryKeys { entity, .. }
            | MappingError::InvalidAutoIncrement { entity, .. }
            | MappingError::InvalidTimeStamp { entity, .. }
            | MappingError::EmptyTableName { entity } => entity,
        }
    }
}
