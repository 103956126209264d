//! Schema introspection: declarations in, metadata out.

use std::collections::HashMap;

use super::entity::{EntityMetadata, EntitySchema};
use super::error::MappingError;
use super::field::ColumnMeta;
use super::naming::{default_table_name, snake_case};
use super::types::ColumnKind;

/// Resolve an [`EntitySchema`] into [`EntityMetadata`].
///
/// Pure: the same schema always yields the same metadata. Table name comes
/// from the schema if set, else from the pluralized snake_case type name.
/// Column names come from a `column:` directive, else from the snake_case
/// field name.
pub fn introspect(schema: &EntitySchema) -> Result<EntityMetadata, MappingError> {
    let entity = schema.type_name();
    let entity_err = || entity.to_string();

    if schema.fields().is_empty() {
        return Err(MappingError::NoFields {
            entity: entity_err(),
        });
    }

    let table_name = match schema.table() {
        Some(table) => table.trim().to_string(),
        None => default_table_name(entity),
    };
    if table_name.is_empty() {
        return Err(MappingError::EmptyTableName {
            entity: entity_err(),
        });
    }

    let mut columns: Vec<ColumnMeta> = Vec::with_capacity(schema.fields().len());
    let mut by_column: HashMap<String, usize> = HashMap::new();
    let mut primary_key: Option<usize> = None;

    for field in schema.fields() {
        if columns.iter().any(|c| c.field_name == field.name) {
            return Err(MappingError::DuplicateField {
                entity: entity_err(),
                field: field.name.clone(),
            });
        }

        let directives = &field.directives;
        let column_name = directives
            .column
            .clone()
            .unwrap_or_else(|| snake_case(&field.name));

        if let Some(&prev) = by_column.get(&column_name.to_ascii_lowercase()) {
            return Err(MappingError::DuplicateColumn {
                entity: entity_err(),
                column: column_name,
                first: columns[prev].field_name.clone(),
                second: field.name.clone(),
            });
        }

        if directives.primary_key {
            if let Some(prev) = primary_key {
                return Err(MappingError::MultiplePrimaryKeys {
                    entity: entity_err(),
                    first: columns[prev].field_name.clone(),
                    second: field.name.clone(),
                });
            }
            primary_key = Some(columns.len());
        }

        if directives.auto_increment {
            let reason = if !directives.primary_key {
                Some("not the primary key")
            } else if field.kind != ColumnKind::Integer {
                Some("not an integer column")
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(MappingError::InvalidAutoIncrement {
                    entity: entity_err(),
                    field: field.name.clone(),
                    reason,
                });
            }
        }

        if (directives.auto_time || directives.auto_update)
            && !matches!(
                field.kind,
                ColumnKind::Integer | ColumnKind::Text | ColumnKind::Temporal
            )
        {
            return Err(MappingError::InvalidTimeStamp {
                entity: entity_err(),
                field: field.name.clone(),
                kind: field.kind,
            });
        }

        by_column.insert(column_name.to_ascii_lowercase(), columns.len());
        columns.push(ColumnMeta {
            field_name: field.name.clone(),
            column_name,
            is_primary_key: directives.primary_key,
            is_auto_generated: directives.auto_increment,
            auto_time: directives.auto_time,
            auto_update: directives.auto_update,
            kind: field.kind,
            nullable: field.nullable && !directives.primary_key,
        });
    }

    let auto_increment = primary_key.is_some_and(|idx| columns[idx].is_auto_generated);

    Ok(EntityMetadata {
        type_name: entity.to_string(),
        table_name,
        columns,
        primary_key,
        auto_increment,
    })
}
