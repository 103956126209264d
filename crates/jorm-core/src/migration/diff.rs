//! Differences between entity metadata and a live table.

use crate::catalog::{ColumnMeta, EntityMetadata};

/// What a live table is missing relative to its entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDiff {
    /// Table name.
    pub table_name: String,
    /// The table does not exist at all.
    pub missing_table: bool,
    /// Mapped columns absent from the live table, in declaration order.
    /// Empty when `missing_table` is set.
    pub missing_columns: Vec<ColumnMeta>,
}

impl SchemaDiff {
    /// Compare `meta` against the live column names, `None` meaning the
    /// table does not exist. Column names compare case-insensitively.
    pub fn compute(meta: &EntityMetadata, live: Option<&[String]>) -> Self {
        let Some(live) = live else {
            return Self {
                table_name: meta.table_name.clone(),
                missing_table: true,
                missing_columns: Vec::new(),
            };
        };

        let missing_columns = meta
            .columns
            .iter()
            .filter(|c| !live.iter().any(|l| l.eq_ignore_ascii_case(&c.column_name)))
            .cloned()
            .collect();

        Self {
            table_name: meta.table_name.clone(),
            missing_table: false,
            missing_columns,
        }
    }

    /// Check if the live table already matches.
    pub fn is_empty(&self) -> bool {
        !self.missing_table && self.missing_columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{introspect, EntitySchema, FieldDef};

    fn meta() -> EntityMetadata {
        introspect(
            &EntitySchema::new("User")
                .with_field(FieldDef::of::<i64>("id").tag("pk;auto"))
                .with_field(FieldDef::of::<String>("name"))
                .with_field(FieldDef::of::<i32>("age")),
        )
        .unwrap()
    }

    #[test]
    fn test_missing_table() {
        let diff = SchemaDiff::compute(&meta(), None);
        assert!(diff.missing_table);
        assert!(diff.missing_columns.is_empty());
        assert!(!diff.is_empty());
    }

    #[test]
    fn test_missing_columns_in_declaration_order() {
        let live = vec!["ID".to_string()];
        let diff = SchemaDiff::compute(&meta(), Some(&live));
        let names: Vec<_> = diff.missing_columns.iter().map(|c| c.column_name.as_str()).collect();
        assert_eq!(names, vec!["name", "age"]);
    }

    #[test]
    fn test_up_to_date() {
        let live = vec!["id".to_string(), "Name".to_string(), "age".to_string(), "extra".to_string()];
        assert!(SchemaDiff::compute(&meta(), Some(&live)).is_empty());
    }
}
