//! Backend-agnostic schema model.
//!
//! Catalog rows from either engine are normalized into these types before
//! rendering. Nothing here knows which engine produced it except the
//! [`Backend`] tag on errors and log lines.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported database backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Backend {
    Oracle,
    SqlServer,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Oracle => write!(f, "Oracle"),
            Backend::SqlServer => write!(f, "SQL Server"),
        }
    }
}

/// A catalog identifier: the catalog text for display plus an uppercase
/// key for comparison.
///
/// Both supported engines compare identifiers case-insensitively while
/// preserving the stored case, so equality and hashing use the key only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identifier {
    display: String,
    key: String,
}

impl Identifier {
    pub fn new(name: impl Into<String>) -> Self {
        let display = name.into();
        let key = display.to_uppercase();
        Self { display, key }
    }

    /// Catalog text as stored.
    pub fn as_str(&self) -> &str {
        &self.display
    }

    /// Uppercased comparison key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Case-insensitive comparison against a raw name.
    pub fn matches(&self, other: &str) -> bool {
        self.key == other.to_uppercase()
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Identifier {}

impl std::hash::Hash for Identifier {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

/// A table within a catalog scope (Oracle schema or SQL Server database).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualifiedName {
    scope: Identifier,
    table: Identifier,
}

impl QualifiedName {
    pub fn new(scope: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            scope: Identifier::new(scope),
            table: Identifier::new(table),
        }
    }

    pub fn scope(&self) -> &Identifier {
        &self.scope
    }

    pub fn table(&self) -> &Identifier {
        &self.table
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.scope, self.table)
    }
}

/// Column referenced by a foreign key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyTarget {
    pub scope: String,
    pub table: String,
    pub column: String,
}

impl ForeignKeyTarget {
    pub fn new(
        scope: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self {
            scope: scope.into(),
            table: table.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for ForeignKeyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.scope, self.table, self.column)
    }
}

/// One column of a normalized table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    /// Length, `precision,scale`, `precision`, `MAX` or empty
    pub length_or_precision: String,
    pub nullable: bool,
    /// Trimmed default expression, empty when none
    pub default_value: String,
    pub is_primary_key: bool,
    pub foreign_key_target: Option<ForeignKeyTarget>,
    /// Catalog comment, empty when none
    pub comment: String,
}

/// A normalized table, columns in physical ordinal order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: QualifiedName,
    pub columns: Vec<ColumnInfo>,
}

impl TableSchema {
    pub fn new(name: QualifiedName) -> Self {
        Self {
            name,
            columns: Vec::new(),
        }
    }

    pub fn primary_key_columns(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns.iter().filter(|c| c.is_primary_key)
    }

    pub fn foreign_key_columns(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns
            .iter()
            .filter(|c| c.foreign_key_target.is_some())
    }
}

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;
