//! Column kinds understood by the catalog.

use serde::{Deserialize, Serialize};

/// Storage class of a mapped column.
///
/// The kind drives DDL type names and tells the migrator what default to
/// use when adding a non-nullable column to a populated table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Signed integer.
    Integer,
    /// Floating point.
    Float,
    /// UTF-8 text.
    Text,
    /// Boolean.
    Boolean,
    /// Timestamp.
    Temporal,
    /// Anything else, stored as a blob.
    Other,
}

impl ColumnKind {
    /// Check if this kind is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnKind::Integer | ColumnKind::Float)
    }
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ColumnKind::Integer => "integer",
            ColumnKind::Float => "float",
            ColumnKind::Text => "text",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Temporal => "temporal",
            ColumnKind::Other => "other",
        };
        f.write_str(name)
    }
}
