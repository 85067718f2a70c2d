//! Raw catalog rows to [`TableSchema`].

use crate::catalog::{RawColumn, RawTable, TypeClassifier, TypeFamily};
use crate::models::{ColumnInfo, ForeignKeyTarget, TableSchema};
use crate::{Result, TableMdError};
use std::collections::{HashMap, HashSet};

/// Builds the backend-agnostic schema for one table.
///
/// Columns are ordered by ordinal position, sizes are computed from the
/// type family, and key membership is matched case-insensitively. Key
/// columns that name no existing column are logged and ignored.
///
/// # Errors
/// Returns [`TableMdError::Normalization`] for an unclassifiable type or a
/// duplicate column name.
pub fn normalize(raw: RawTable, classifier: &dyn TypeClassifier) -> Result<TableSchema> {
    let RawTable {
        name,
        mut columns,
        primary_keys,
        foreign_keys,
    } = raw;
    columns.sort_by_key(|c| c.ordinal);

    let primary_keys: HashSet<String> = primary_keys.iter().map(|k| k.to_uppercase()).collect();

    let mut fk_targets: HashMap<String, ForeignKeyTarget> = HashMap::new();
    for fk in foreign_keys {
        fk_targets.entry(fk.column.to_uppercase()).or_insert(fk.target);
    }

    let mut seen = HashSet::with_capacity(columns.len());
    let mut schema = TableSchema::new(name);

    for column in columns {
        let key = column.name.to_uppercase();
        if !seen.insert(key.clone()) {
            return Err(TableMdError::normalization(
                schema.name.to_string(),
                column.name,
                "duplicate column name",
            ));
        }

        let family = classifier
            .classify(column.classification_type())
            .ok_or_else(|| {
                TableMdError::normalization(
                    schema.name.to_string(),
                    column.name.as_str(),
                    format!(
                        "unrecognized data type '{}'",
                        column.classification_type()
                    ),
                )
            })?;

        let length_or_precision = length_or_precision(&column, family);
        schema.columns.push(ColumnInfo {
            length_or_precision,
            nullable: column.nullable,
            default_value: column
                .default_value
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            is_primary_key: primary_keys.contains(&key),
            foreign_key_target: fk_targets.get(&key).cloned(),
            comment: column.comment.unwrap_or_default(),
            name: column.name,
            data_type: column.data_type,
        });
    }

    for pk in primary_keys.iter().filter(|k| !seen.contains(*k)) {
        tracing::warn!(
            "Primary key column {} not found in table {}; ignoring",
            pk,
            schema.name
        );
    }
    for fk in fk_targets.keys().filter(|k| !seen.contains(*k)) {
        tracing::warn!(
            "Foreign key column {} not found in table {}; ignoring",
            fk,
            schema.name
        );
    }

    Ok(schema)
}

/// The size cell for one column.
pub fn length_or_precision(column: &RawColumn, family: TypeFamily) -> String {
    match family {
        TypeFamily::Character | TypeFamily::Binary => match column.length {
            Some(length) if length < 0 => "MAX".to_string(),
            Some(length) => length.to_string(),
            None => String::new(),
        },
        TypeFamily::Numeric => match (column.precision, column.scale) {
            (Some(precision), Some(scale)) if precision > 0 && scale != 0 => {
                format!("{precision},{scale}")
            }
            (Some(precision), _) if precision > 0 => precision.to_string(),
            _ => String::new(),
        },
        TypeFamily::Unsized => String::new(),
    }
}
