//! Entity declarations and resolved entity metadata.

use serde::{Deserialize, Serialize};

use super::field::{ColumnMeta, FieldDef};
use crate::value::{CoerceError, Value};

/// A Rust type mapped to one table.
///
/// Implementations are usually generated with [`impl_entity!`](crate::impl_entity).
/// `Default` supplies the blank value rows are marshaled into.
pub trait Entity: Default + Send + Sync + 'static {
    /// Describe the entity's fields and directives.
    fn schema() -> EntitySchema;

    /// Explicit table name. Takes precedence over the schema and the
    /// pluralized type name.
    fn table_name() -> Option<&'static str> {
        None
    }

    /// Read a field by its Rust name.
    fn get(&self, field: &str) -> Option<Value>;

    /// Write a field by its Rust name, coercing the value to the field type.
    fn set(&mut self, field: &str, value: Value) -> Result<(), CoerceError>;
}

/// Declarative description of an entity, registered once per type.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySchema {
    type_name: String,
    table: Option<String>,
    fields: Vec<FieldDef>,
}

impl EntitySchema {
    /// Create a schema for the named type.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            table: None,
            fields: Vec::new(),
        }
    }

    /// Set an explicit table name.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Add a field.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Add multiple fields.
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = FieldDef>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Type name the schema was declared for.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Explicit table name, if any.
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Declared fields in order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }
}

/// Resolved table mapping for one entity type. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMetadata {
    /// Entity type name.
    pub type_name: String,
    /// Table name.
    pub table_name: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnMeta>,
    /// Index of the primary key column in `columns`.
    pub primary_key: Option<usize>,
    /// Whether the primary key is store-generated.
    pub auto_increment: bool,
}

impl EntityMetadata {
    /// The primary key column.
    pub fn primary_key(&self) -> Option<&ColumnMeta> {
        self.primary_key.and_then(|idx| self.columns.get(idx))
    }

    /// Look up a column by field name or column name.
    pub fn column(&self, name: &str) -> Option<&ColumnMeta> {
        self.columns
            .iter()
            .find(|c| c.field_name == name)
            .or_else(|| self.columns.iter().find(|c| c.matches(name)))
    }

    /// Look up a column by its exact column name, ignoring ASCII case.
    pub fn column_named(&self, column: &str) -> Option<&ColumnMeta> {
        self.columns
            .iter()
            .find(|c| c.column_name.eq_ignore_ascii_case(column))
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.column_name.as_str())
    }

    /// Columns written by INSERT.
    pub fn insert_columns(&self) -> impl Iterator<Item = &ColumnMeta> {
        self.columns.iter().filter(|c| c.is_insertable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ColumnKind;

    #[test]
    fn test_schema_builder() {
        let schema = EntitySchema::new("User")
            .with_table("people")
            .with_field(FieldDef::of::<i64>("ID").tag("primaryKey;autoIncrement"))
            .with_fields([
                FieldDef::of::<String>("Name"),
                FieldDef::new("Age", ColumnKind::Integer),
            ]);

        assert_eq!(schema.type_name(), "User");
        assert_eq!(schema.table(), Some("people"));
        assert_eq!(schema.fields().len(), 3);
        assert!(schema.fields()[0].directives.auto_increment);
    }

    #[test]
    fn test_primary_key_index_out_of_range() {
        let schema = EntitySchema::new("Tag").with_field(FieldDef::of::<i64>("ID").primary_key());
        let mut meta = crate::catalog::introspect(&schema).unwrap();
        assert_eq!(meta.primary_key().map(|c| c.field_name.as_str()), Some("ID"));

        meta.primary_key = Some(4);
        assert!(meta.primary_key().is_none());

        let json = serde_json::to_string(&meta).unwrap();
        let loaded: EntityMetadata = serde_json::from_str(&json).unwrap();
        assert!(loaded.primary_key().is_none());
    }
}
