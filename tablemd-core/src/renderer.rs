//! Markdown data-dictionary rendering.
//!
//! The document layout is fixed: a level-two heading with the table name,
//! a blank line, then one eight-column Markdown table with a row per
//! column in schema order. Lines are joined with `\n` and there is no
//! trailing newline.

use crate::models::{ColumnInfo, TableSchema};

const HEADING_PREFIX: &str = "## 表格名稱:";
const HEADER_ROW: &str = "| 欄位 | 資料型別 | 長度/精度 | Nullable | 預設值 | 主鍵 | 外鍵 | 說明 |";
const SEPARATOR_ROW: &str = "|------|----------|-----------|----------|--------|------|------|------|";

/// Renders one table document.
pub fn render(schema: &TableSchema) -> String {
    let mut lines = Vec::with_capacity(schema.columns.len().saturating_add(4));
    lines.push(format!(
        "{HEADING_PREFIX}{}",
        escape_cell(schema.name.table().as_str())
    ));
    lines.push(String::new());
    lines.push(HEADER_ROW.to_string());
    lines.push(SEPARATOR_ROW.to_string());
    lines.extend(schema.columns.iter().map(render_row));
    lines.join("\n")
}

fn render_row(column: &ColumnInfo) -> String {
    let foreign_key = column
        .foreign_key_target
        .as_ref()
        .map(|target| format!("FK → `{}`", escape_cell(&target.to_string())))
        .unwrap_or_default();

    let cells = [
        escape_cell(&column.name),
        escape_cell(&column.data_type),
        escape_cell(&column.length_or_precision),
        if column.nullable { "Y" } else { "N" }.to_string(),
        escape_cell(&column.default_value),
        if column.is_primary_key { "Y" } else { "" }.to_string(),
        foreign_key,
        escape_cell(&column.comment),
    ];

    format!("| {} |", cells.join(" | "))
}

/// Escapes text for a single Markdown table cell.
///
/// `|` would end the cell and a line break would end the row.
pub fn escape_cell(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('|', "\\|")
        .replace('\n', "<br>")
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::catalog::{RawColumn, RawTable};
    use crate::models::{Backend, QualifiedName};
    use crate::normalizer::normalize;
    use proptest::prelude::*;

    fn raw_table(specs: &[(String, bool, Option<String>)]) -> RawTable {
        let columns = specs
            .iter()
            .enumerate()
            .map(|(i, (name, nullable, comment))| {
                let ordinal = u32::try_from(i).unwrap_or(u32::MAX).saturating_add(1);
                let mut column = RawColumn::new(name.as_str(), "VARCHAR2", ordinal).with_length(20);
                column.nullable = *nullable;
                column.comment = comment.clone();
                column
            })
            .collect();
        RawTable {
            name: QualifiedName::new("APPS", "PROP_T"),
            columns,
            primary_keys: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    proptest! {
        #[test]
        fn row_count_matches_column_count(
            names in proptest::collection::hash_set("[A-Z][A-Z0-9_]{0,12}", 0..30),
            nullable in any::<bool>(),
            comment in proptest::option::of("\\PC{0,40}"),
        ) {
            let specs: Vec<_> = names
                .into_iter()
                .map(|n| (n, nullable, comment.clone()))
                .collect();
            let schema = normalize(raw_table(&specs), &Backend::Oracle).expect("normalize");
            let first = render(&schema);
            let second = render(&schema);

            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.lines().count(), specs.len() + 4);
            for (line, (name, _, _)) in first.lines().skip(4).zip(&specs) {
                let expected_prefix = format!("| {name} |");
                prop_assert!(line.starts_with(&expected_prefix));
            }
        }
    }
}
