//! Typed access to catalog rows.
//!
//! Drivers hand back every value as optional text, so providers decode
//! columns by position with consistent error context.

use super::DriverError;

/// One result row: values in `SELECT` order, SQL NULL as `None`.
pub type CatalogRow = Vec<Option<String>>;

/// Extension trait for extracting typed values from catalog rows
/// with consistent error handling.
///
/// # Example
/// ```rust
/// use tablemd_core::catalog::RowExt;
///
/// let row = vec![Some("ORDERS".to_string()), None, Some("12".to_string())];
/// assert_eq!(row.required_text(0, "table_name").unwrap(), "ORDERS");
/// assert_eq!(row.optional_text(1, "comments").unwrap(), None);
/// assert_eq!(row.optional_int(2, "char_length").unwrap(), Some(12));
/// ```
pub trait RowExt {
    /// Non-null text at `index`.
    ///
    /// # Errors
    /// Returns a query-level [`DriverError`] if the value is missing or NULL.
    fn required_text(&self, index: usize, field: &str) -> Result<String, DriverError>;

    /// Text at `index`, `None` when NULL.
    ///
    /// # Errors
    /// Returns a query-level [`DriverError`] if the row is too short.
    fn optional_text(&self, index: usize, field: &str) -> Result<Option<String>, DriverError>;

    /// Integer at `index`, `None` when NULL.
    ///
    /// # Errors
    /// Returns a query-level [`DriverError`] if the text is not an integer.
    fn optional_int(&self, index: usize, field: &str) -> Result<Option<i64>, DriverError>;

    /// Catalog flag at `index`: `Y`/`N` (Oracle) or `1`/`0` (SQL Server).
    ///
    /// # Errors
    /// Returns a query-level [`DriverError`] for NULL or any other text.
    fn flag(&self, index: usize, field: &str) -> Result<bool, DriverError>;
}

impl RowExt for [Option<String>] {
    fn required_text(&self, index: usize, field: &str) -> Result<String, DriverError> {
        self.optional_text(index, field)?
            .ok_or_else(|| DriverError::query(format!("catalog returned NULL for {field}")))
    }

    fn optional_text(&self, index: usize, field: &str) -> Result<Option<String>, DriverError> {
        self.get(index).cloned().ok_or_else(|| {
            DriverError::query(format!(
                "catalog row has {} values, expected {field} at position {index}",
                self.len()
            ))
        })
    }

    fn optional_int(&self, index: usize, field: &str) -> Result<Option<i64>, DriverError> {
        self.optional_text(index, field)?
            .map(|text| {
                let trimmed = text.trim();
                // NUMBER columns can come back as "10.0" from some drivers
                let integral = trimmed.strip_suffix(".0").unwrap_or(trimmed);
                integral.parse::<i64>().map_err(|_| {
                    DriverError::query(format!("{field} is not an integer: '{trimmed}'"))
                })
            })
            .transpose()
    }

    fn flag(&self, index: usize, field: &str) -> Result<bool, DriverError> {
        let value = self.required_text(index, field)?;
        match value.trim().to_ascii_uppercase().as_str() {
            "Y" | "YES" | "1" | "TRUE" => Ok(true),
            "N" | "NO" | "0" | "FALSE" => Ok(false),
            other => Err(DriverError::query(format!(
                "{field} is not a flag: '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[Option<&str>]) -> CatalogRow {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    #[test]
    fn test_required_text_rejects_null() {
        let r = row(&[Some("ID"), None]);
        assert_eq!(r.required_text(0, "column_name").unwrap(), "ID");
        let err = r.required_text(1, "data_type").unwrap_err();
        assert!(!err.is_connection());
        assert!(err.to_string().contains("data_type"));
    }

    #[test]
    fn test_short_row_is_query_error() {
        let r = row(&[Some("ID")]);
        let err = r.optional_text(3, "comments").unwrap_err();
        assert!(err.to_string().contains("position 3"));
    }

    #[test]
    fn test_optional_int_parsing() {
        let r = row(&[Some(" 42 "), Some("10.0"), None, Some("abc"), Some("-1")]);
        assert_eq!(r.optional_int(0, "a").unwrap(), Some(42));
        assert_eq!(r.optional_int(1, "b").unwrap(), Some(10));
        assert_eq!(r.optional_int(2, "c").unwrap(), None);
        assert!(r.optional_int(3, "d").is_err());
        assert_eq!(r.optional_int(4, "e").unwrap(), Some(-1));
    }

    #[test]
    fn test_flag_values() {
        let r = row(&[Some("Y"), Some("N"), Some("1"), Some("0"), Some("maybe"), None]);
        assert!(r.flag(0, "nullable").unwrap());
        assert!(!r.flag(1, "nullable").unwrap());
        assert!(r.flag(2, "is_nullable").unwrap());
        assert!(!r.flag(3, "is_nullable").unwrap());
        assert!(r.flag(4, "nullable").is_err());
        assert!(r.flag(5, "nullable").is_err());
    }
}
