//! Field declarations and resolved column metadata.

use serde::{Deserialize, Serialize};

use super::directive::Directives;
use super::types::ColumnKind;
use crate::value::SqlType;

/// A field declaration within an [`EntitySchema`](super::EntitySchema).
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// Rust field name.
    pub name: String,
    /// Column kind.
    pub kind: ColumnKind,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// Mapping directives.
    pub directives: Directives,
}

impl FieldDef {
    /// Create a non-nullable field of the given kind.
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: false,
            directives: Directives::default(),
        }
    }

    /// Create a field whose kind and nullability come from its Rust type.
    pub fn of<T: SqlType>(name: impl Into<String>) -> Self {
        Self {
            nullable: T::NULLABLE,
            ..Self::new(name, T::KIND)
        }
    }

    /// Apply a directive tag string such as `"primaryKey;autoIncrement"`.
    pub fn tag(mut self, tag: &str) -> Self {
        self.directives.merge(tag);
        self
    }

    /// Mark as primary key.
    pub fn primary_key(mut self) -> Self {
        self.directives.primary_key = true;
        self
    }

    /// Mark as a store-generated primary key.
    pub fn auto_increment(mut self) -> Self {
        self.directives.auto_increment = true;
        self
    }

    /// Set an explicit column name.
    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.directives.column = Some(name.into());
        self
    }

    /// Stamp with the current time on create.
    pub fn auto_time(mut self) -> Self {
        self.directives.auto_time = true;
        self
    }

    /// Stamp with the current time on every update.
    pub fn auto_update(mut self) -> Self {
        self.directives.auto_update = true;
        self
    }

    /// Allow NULL.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// Resolved mapping between one entity field and one table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    /// Rust field name.
    pub field_name: String,
    /// Column name in the table.
    pub column_name: String,
    /// Column is the primary key.
    pub is_primary_key: bool,
    /// Value is assigned by the store and never written by the engine.
    pub is_auto_generated: bool,
    /// Stamped with the current time on create.
    pub auto_time: bool,
    /// Stamped with the current time on every update.
    pub auto_update: bool,
    /// Column kind.
    pub kind: ColumnKind,
    /// Whether the column accepts NULL.
    pub nullable: bool,
}

impl ColumnMeta {
    /// Whether INSERT writes this column.
    pub fn is_insertable(&self) -> bool {
        !self.is_auto_generated
    }

    /// Whether UPDATE may write a caller-supplied value to this column.
    pub fn is_updatable(&self) -> bool {
        !self.is_primary_key && !self.is_auto_generated && !self.auto_time && !self.auto_update
    }

    /// Check if this column answers to `name` as either field or column.
    pub fn matches(&self, name: &str) -> bool {
        self.field_name == name || self.column_name.eq_ignore_ascii_case(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_def_builder() {
        let field = FieldDef::of::<i64>("ID").tag("primaryKey").auto_increment();

        assert_eq!(field.name, "ID");
        assert_eq!(field.kind, ColumnKind::Integer);
        assert!(!field.nullable);
        assert!(field.directives.primary_key);
        assert!(field.directives.auto_increment);
    }

    #[test]
    fn test_optional_field() {
        let field = FieldDef::of::<Option<String>>("Nickname").column("nick");

        assert!(field.nullable);
        assert_eq!(field.kind, ColumnKind::Text);
        assert_eq!(field.directives.column.as_deref(), Some("nick"));
    }

    #[test]
    fn test_column_meta_write_rules() {
        let base = ColumnMeta {
            field_name: "UpdatedAt".into(),
            column_name: "updated_at".into(),
            is_primary_key: false,
            is_auto_generated: false,
            auto_time: false,
            auto_update: true,
            kind: ColumnKind::Temporal,
            nullable: false,
        };
        assert!(base.is_insertable());
        assert!(!base.is_updatable());
        assert!(base.matches("UpdatedAt"));
        assert!(base.matches("UPDATED_AT"));
        assert!(!base.matches("updatedat"));
    }
}
