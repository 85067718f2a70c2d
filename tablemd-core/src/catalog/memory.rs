//! In-memory fixture catalog.
//!
//! Serves hand-built tables without a database. Tables are listed in the
//! order they were added, which stands in for the catalog's enumeration
//! order. Failures can be injected per table to exercise the run policy.

use super::{CatalogProvider, DriverError, RawColumn, RawForeignKey};
use crate::models::{Backend, QualifiedName};
use crate::resolver::TablePattern;
use crate::{Result, TableMdError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A fixture table.
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    pub name: String,
    pub columns: Vec<RawColumn>,
    pub primary_keys: Vec<String>,
    pub foreign_keys: Vec<RawForeignKey>,
}

impl MemoryTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_column(mut self, column: RawColumn) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_keys.push(column.into());
        self
    }

    pub fn with_foreign_key(mut self, foreign_key: RawForeignKey) -> Self {
        self.foreign_keys.push(foreign_key);
        self
    }
}

/// Catalog provider backed by fixture tables.
pub struct MemoryCatalog {
    backend: Backend,
    scope: String,
    tables: Vec<MemoryTable>,
    failures: HashMap<String, DriverError>,
    closed: Arc<AtomicBool>,
}

impl MemoryCatalog {
    pub fn new(backend: Backend, scope: impl Into<String>) -> Self {
        Self {
            backend,
            scope: scope.into(),
            tables: Vec::new(),
            failures: HashMap::new(),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_table(mut self, table: MemoryTable) -> Self {
        self.tables.push(table);
        self
    }

    /// Makes every per-table query for `table` fail with `error`.
    ///
    /// The key `*` makes table listing fail instead. Use
    /// [`DriverError::connection`] to simulate a dropped session.
    pub fn with_failure(mut self, table: &str, error: DriverError) -> Self {
        self.failures.insert(table.to_uppercase(), error);
        self
    }

    /// Flag set once [`CatalogProvider::close`] has run.
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }

    fn lookup(&self, table: &QualifiedName, context: &str) -> Result<&MemoryTable> {
        if let Some(error) = self.failures.get(table.table().key()) {
            return Err(TableMdError::from_driver(
                self.backend,
                table.table().as_str(),
                context,
                error.clone(),
            ));
        }

        self.tables
            .iter()
            .find(|t| table.table().matches(&t.name))
            .ok_or_else(|| {
                TableMdError::from_driver(
                    self.backend,
                    table.table().as_str(),
                    context,
                    DriverError::query(format!("table {table} does not exist")),
                )
            })
    }
}

#[async_trait]
impl CatalogProvider for MemoryCatalog {
    fn backend(&self) -> Backend {
        self.backend
    }

    fn scope(&self) -> &str {
        &self.scope
    }

    async fn list_matching_tables(
        &mut self,
        pattern: &TablePattern,
    ) -> Result<Vec<QualifiedName>> {
        if let Some(error) = self.failures.get("*") {
            return Err(TableMdError::from_driver(
                self.backend,
                pattern.as_str(),
                "listing tables",
                error.clone(),
            ));
        }

        Ok(self
            .tables
            .iter()
            .filter(|t| pattern.matches(&t.name))
            .map(|t| QualifiedName::new(self.scope.as_str(), t.name.as_str()))
            .collect())
    }

    async fn fetch_columns(&mut self, table: &QualifiedName) -> Result<Vec<RawColumn>> {
        Ok(self.lookup(table, "fetching columns")?.columns.clone())
    }

    async fn fetch_primary_keys(&mut self, table: &QualifiedName) -> Result<Vec<String>> {
        Ok(self
            .lookup(table, "fetching primary keys")?
            .primary_keys
            .clone())
    }

    async fn fetch_foreign_keys(&mut self, table: &QualifiedName) -> Result<Vec<RawForeignKey>> {
        Ok(self
            .lookup(table, "fetching foreign keys")?
            .foreign_keys
            .clone())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> MemoryCatalog {
        MemoryCatalog::new(Backend::Oracle, "APPS")
            .with_table(MemoryTable::new("ABC1"))
            .with_table(MemoryTable::new("XYZ1"))
            .with_table(MemoryTable::new("ABC2"))
    }

    #[tokio::test]
    async fn test_listing_keeps_insertion_order() {
        let mut catalog = catalog();
        let pattern = TablePattern::parse("abc%").expect("pattern");
        let tables = catalog.list_matching_tables(&pattern).await.expect("list");
        let names: Vec<_> = tables.iter().map(|t| t.table().as_str()).collect();
        assert_eq!(names, vec!["ABC1", "ABC2"]);
    }

    #[tokio::test]
    async fn test_injected_failure_is_scoped_to_table() {
        let mut catalog = catalog().with_failure("xyz1", DriverError::query("ORA-00942"));

        let err = catalog
            .fetch_columns(&QualifiedName::new("APPS", "XYZ1"))
            .await
            .unwrap_err();
        assert!(matches!(err, TableMdError::CatalogQuery { .. }));

        assert!(
            catalog
                .fetch_columns(&QualifiedName::new("APPS", "ABC1"))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_listing_failure_with_wildcard_key() {
        let mut catalog = catalog().with_failure("*", DriverError::connection("ORA-12541"));
        let pattern = TablePattern::parse("ABC1").expect("pattern");
        let err = catalog.list_matching_tables(&pattern).await.unwrap_err();
        assert!(matches!(err, TableMdError::Connection { .. }));
    }

    #[tokio::test]
    async fn test_close_sets_flag() {
        let catalog = catalog();
        let closed = catalog.closed_flag();
        Box::new(catalog).close().await.expect("close");
        assert!(closed.load(Ordering::SeqCst));
    }
}
