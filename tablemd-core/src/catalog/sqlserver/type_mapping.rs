//! SQL Server type name classification.
//!
//! Names are the `sys.types` system type names. User-defined alias types
//! are classified through their base type, which the column query returns
//! alongside the alias.

use crate::catalog::TypeFamily;

/// Classifies a SQL Server system type name.
pub fn classify_sqlserver_type(type_name: &str) -> Option<TypeFamily> {
    match type_name.trim().to_lowercase().as_str() {
        "char" | "varchar" | "nchar" | "nvarchar" | "sysname" => Some(TypeFamily::Character),
        "tinyint" | "smallint" | "int" | "bigint" | "decimal" | "numeric" | "money"
        | "smallmoney" | "float" | "real" => Some(TypeFamily::Numeric),
        "binary" | "varbinary" => Some(TypeFamily::Binary),
        // datetime2, time and datetimeoffset report a precision in
        // sys.columns that is not shown.
        "bit" | "date" | "time" | "datetime" | "datetime2" | "datetimeoffset"
        | "smalldatetime" | "text" | "ntext" | "image" | "uniqueidentifier" | "xml"
        | "sql_variant" | "timestamp" | "rowversion" | "hierarchyid" | "geometry"
        | "geography" => Some(TypeFamily::Unsized),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_character_types() {
        for name in ["char", "varchar", "NCHAR", "nvarchar", "sysname"] {
            assert_eq!(
                classify_sqlserver_type(name),
                Some(TypeFamily::Character),
                "{name}"
            );
        }
    }

    #[test]
    fn test_numeric_types() {
        for name in ["int", "bigint", "decimal", "numeric", "money", "float"] {
            assert_eq!(
                classify_sqlserver_type(name),
                Some(TypeFamily::Numeric),
                "{name}"
            );
        }
    }

    #[test]
    fn test_binary_and_unsized_types() {
        assert_eq!(classify_sqlserver_type("varbinary"), Some(TypeFamily::Binary));
        assert_eq!(classify_sqlserver_type("bit"), Some(TypeFamily::Unsized));
        assert_eq!(classify_sqlserver_type("datetime2"), Some(TypeFamily::Unsized));
        assert_eq!(
            classify_sqlserver_type("uniqueidentifier"),
            Some(TypeFamily::Unsized)
        );
    }

    #[test]
    fn test_unknown_type() {
        assert_eq!(classify_sqlserver_type("PhoneNumber"), None);
        assert_eq!(classify_sqlserver_type("VARCHAR2"), None);
    }
}
