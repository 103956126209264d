//! Migration plans and DDL rendering.

use serde::{Deserialize, Serialize};

use super::diff::SchemaDiff;
use crate::catalog::{ColumnMeta, EntityMetadata};
use crate::query::Dialect;

/// One schema change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MigrationOp {
    /// Create the table with every mapped column.
    CreateTable {
        /// Columns in declaration order.
        columns: Vec<ColumnMeta>,
    },
    /// Add one column to an existing table.
    AddColumn(ColumnMeta),
}

/// Ordered schema changes for one table. Applied in order, never reordered.
///
/// A plan either creates the table or adds columns to it, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationPlan {
    /// Table the plan targets.
    pub table_name: String,
    /// Operations in application order.
    pub operations: Vec<MigrationOp>,
}

impl MigrationPlan {
    /// Build a plan from a diff.
    pub fn from_diff(meta: &EntityMetadata, diff: SchemaDiff) -> Self {
        let operations = if diff.missing_table {
            vec![MigrationOp::CreateTable {
                columns: meta.columns.clone(),
            }]
        } else {
            diff.missing_columns.into_iter().map(MigrationOp::AddColumn).collect()
        };

        Self {
            table_name: diff.table_name,
            operations,
        }
    }

    /// Check if there is nothing to do.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Render every operation as DDL without running it.
    pub fn statements(&self, dialect: Dialect) -> Vec<String> {
        let table = dialect.quote_ident(&self.table_name);
        self.operations
            .iter()
            .map(|op| match op {
                MigrationOp::CreateTable { columns } => {
                    let defs: Vec<_> = columns
                        .iter()
                        .map(|c| column_definition(c, dialect, false))
                        .collect();
                    format!("CREATE TABLE IF NOT EXISTS {table} ({})", defs.join(", "))
                }
                MigrationOp::AddColumn(column) => format!(
                    "ALTER TABLE {table} ADD COLUMN {}",
                    column_definition(column, dialect, true)
                ),
            })
            .collect()
    }
}

/// Render one column definition.
///
/// With `adding`, the column is destined for ALTER TABLE: key constraints are
/// left out and NOT NULL columns get a zero DEFAULT so rows already in the
/// table stay valid.
pub fn column_definition(column: &ColumnMeta, dialect: Dialect, adding: bool) -> String {
    let name = dialect.quote_ident(&column.column_name);

    if !adding && column.is_primary_key && column.is_auto_generated {
        return format!("{name} {}", dialect.auto_increment_column());
    }

    let mut def = format!("{name} {}", dialect.column_type(column.kind));
    if !column.nullable {
        def.push_str(" NOT NULL");
        if adding {
            def.push_str(" DEFAULT ");
            def.push_str(dialect.zero_default(column.kind));
        }
    }
    if !adding && column.is_primary_key {
        def.push_str(" PRIMARY KEY");
    }
    def
}
