//! Run orchestration: resolve, then fetch, normalize, render and write each
//! table in resolution order.
//!
//! Per-table catalog and normalization failures skip that table and are
//! recorded in the [`RunReport`]. Connection and sink failures end the run.
//! The provider is closed on every path out of [`DictionaryGenerator::run`].

use crate::catalog::{CatalogProvider, fetch_raw_table};
use crate::models::QualifiedName;
use crate::normalizer::normalize;
use crate::output::{Document, DocumentSink};
use crate::renderer::render;
use crate::resolver::{TablePattern, resolve};
use crate::{Result, TableMdError};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// A table that was skipped.
#[derive(Debug)]
pub struct TableFailure {
    pub table: QualifiedName,
    pub error: TableMdError,
}

/// Outcome of one run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Scope the documents were written under
    pub scope: String,
    /// Paths returned by the sink, in resolution order
    pub written: Vec<PathBuf>,
    pub failures: Vec<TableFailure>,
}

impl RunReport {
    /// Whether every resolved table produced a document.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn tables_resolved(&self) -> usize {
        self.written.len().saturating_add(self.failures.len())
    }
}

/// Drives one data-dictionary run against a catalog provider.
pub struct DictionaryGenerator<S: DocumentSink> {
    sink: S,
    output_scope: Option<String>,
}

impl<S: DocumentSink> DictionaryGenerator<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            output_scope: None,
        }
    }

    /// Directory name for documents; defaults to the provider's scope.
    #[must_use]
    pub fn with_output_scope(mut self, scope: impl Into<String>) -> Self {
        self.output_scope = Some(scope.into());
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Generates one document per table matching `pattern`.
    ///
    /// Consumes the provider and always closes it.
    ///
    /// # Errors
    /// Returns error if:
    /// - no table matches the pattern
    /// - the connection fails or is lost
    /// - the sink cannot store a document
    pub async fn run(
        &mut self,
        mut provider: Box<dyn CatalogProvider>,
        pattern: &TablePattern,
    ) -> Result<RunReport> {
        let outcome = self.generate(provider.as_mut(), pattern).await;

        if let Err(e) = provider.close().await {
            warn!("Failed to close catalog connection: {}", e);
        }

        outcome
    }

    async fn generate(
        &mut self,
        provider: &mut dyn CatalogProvider,
        pattern: &TablePattern,
    ) -> Result<RunReport> {
        let tables = resolve(pattern, provider).await?;
        let scope = self
            .output_scope
            .clone()
            .unwrap_or_else(|| provider.scope().to_string());

        let mut report = RunReport {
            scope,
            ..RunReport::default()
        };

        for table in tables {
            let outcome = self.process_table(provider, &report.scope, &table).await;
            match outcome {
                Ok(path) => {
                    info!("Generated {} -> {}", table, path.display());
                    report.written.push(path);
                }
                Err(error) if !error.is_fatal() => {
                    warn!("Skipping {}: {}", table, error);
                    report.failures.push(TableFailure { table, error });
                }
                Err(error) => return Err(error),
            }
        }

        info!(
            "Finished: {} document(s) written, {} table(s) skipped",
            report.written.len(),
            report.failures.len()
        );
        Ok(report)
    }

    async fn process_table(
        &mut self,
        provider: &mut dyn CatalogProvider,
        scope: &str,
        table: &QualifiedName,
    ) -> Result<PathBuf> {
        let raw = fetch_raw_table(provider, table).await?;
        let schema = normalize(raw, &provider.backend())?;
        debug!(
            "{}: {} column(s), {} primary key column(s), {} foreign key column(s)",
            table,
            schema.columns.len(),
            schema.primary_key_columns().count(),
            schema.foreign_key_columns().count()
        );
        let document = Document::new(scope, table.clone(), render(&schema));
        self.sink.write_document(&document).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DriverError, MemoryCatalog, MemoryTable, RawColumn};
    use crate::models::Backend;
    use crate::output::MemorySink;
    use std::sync::atomic::Ordering;

    fn table(name: &str) -> MemoryTable {
        MemoryTable::new(name)
            .with_column(RawColumn::new("ID", "NUMBER", 1).with_precision(9, None))
    }

    #[tokio::test]
    async fn test_output_scope_overrides_provider_scope() {
        let catalog = MemoryCatalog::new(Backend::Oracle, "SHARED").with_table(table("T1"));
        let mut generator =
            DictionaryGenerator::new(MemorySink::default()).with_output_scope("SCOTT");
        let pattern = TablePattern::parse("T1").expect("pattern");

        let report = generator.run(Box::new(catalog), &pattern).await.expect("run");
        assert_eq!(report.scope, "SCOTT");
        assert_eq!(
            generator.sink().documents[0].relative_path,
            PathBuf::from("SCOTT").join("TABLE_T1.md")
        );
    }

    #[tokio::test]
    async fn test_per_table_failure_is_recorded() {
        let catalog = MemoryCatalog::new(Backend::Oracle, "APPS")
            .with_table(table("T1"))
            .with_table(table("T2"))
            .with_failure("T1", DriverError::query("ORA-01031: insufficient privileges"));
        let closed = catalog.closed_flag();
        let mut generator = DictionaryGenerator::new(MemorySink::default());
        let pattern = TablePattern::parse("T%").expect("pattern");

        let report = generator.run(Box::new(catalog), &pattern).await.expect("run");
        assert!(!report.is_complete());
        assert_eq!(report.tables_resolved(), 2);
        assert_eq!(report.failures[0].table.table().as_str(), "T1");
        assert_eq!(generator.sink().documents.len(), 1);
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_lost_connection_aborts_run() {
        let catalog = MemoryCatalog::new(Backend::SqlServer, "Sales")
            .with_table(table("T1"))
            .with_table(table("T2"))
            .with_failure("T1", DriverError::connection("connection reset by peer"));
        let closed = catalog.closed_flag();
        let mut generator = DictionaryGenerator::new(MemorySink::default());
        let pattern = TablePattern::parse("T%").expect("pattern");

        let err = generator.run(Box::new(catalog), &pattern).await.unwrap_err();
        assert!(matches!(err, TableMdError::Connection { .. }));
        assert!(generator.sink().documents.is_empty());
        assert!(closed.load(Ordering::SeqCst));
    }
}
