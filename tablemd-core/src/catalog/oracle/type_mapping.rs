//! Oracle type name classification.
//!
//! `ALL_TAB_COLUMNS.DATA_TYPE` carries the fractional-second or interval
//! qualifiers inline (`TIMESTAMP(6) WITH TIME ZONE`), so only the leading
//! keyword decides the family for those.

use crate::catalog::TypeFamily;

/// Classifies an Oracle `DATA_TYPE` value.
pub fn classify_oracle_type(type_name: &str) -> Option<TypeFamily> {
    let normalized = type_name.trim().to_uppercase();

    if normalized.starts_with("TIMESTAMP") || normalized.starts_with("INTERVAL") {
        return Some(TypeFamily::Unsized);
    }

    match normalized.as_str() {
        "VARCHAR2" | "NVARCHAR2" | "VARCHAR" | "CHAR" | "NCHAR" => Some(TypeFamily::Character),
        "NUMBER" | "FLOAT" | "BINARY_FLOAT" | "BINARY_DOUBLE" | "INTEGER" | "SMALLINT"
        | "DECIMAL" => Some(TypeFamily::Numeric),
        "RAW" => Some(TypeFamily::Binary),
        "DATE" | "CLOB" | "NCLOB" | "BLOB" | "BFILE" | "LONG" | "LONG RAW" | "ROWID"
        | "UROWID" | "XMLTYPE" | "JSON" | "BOOLEAN" | "SDO_GEOMETRY" | "ANYDATA" => {
            Some(TypeFamily::Unsized)
        }
        _ => None,
    }
}
