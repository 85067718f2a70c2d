//! Catalog query providers for unified schema introspection.
//!
//! All engine-specific SQL lives behind [`CatalogProvider`]; the resolver,
//! normalizer and renderer only ever see the raw row types defined here.
//!
//! # Module Structure
//! - `rows`: typed access to untyped catalog rows
//! - `memory`: in-memory fixture catalog
//! - `oracle`: `ALL_*` dictionary views, owner-scoped
//! - `sqlserver`: `sys.*` catalog views, database-scoped
//!
//! Providers do not talk to a driver directly: they issue SQL through a
//! [`CatalogConnection`], the opaque "run query, get rows" capability. The
//! driver-backed connections are feature-gated (`mssql`, `oracle`).

use crate::config::BackendConfig;
use crate::models::{Backend, ForeignKeyTarget, QualifiedName};
use crate::resolver::TablePattern;
use crate::{Result, TableMdError};
use async_trait::async_trait;

pub mod memory;
pub mod oracle;
pub mod rows;
pub mod sqlserver;

pub use memory::{MemoryCatalog, MemoryTable};
pub use oracle::OracleCatalog;
pub use rows::{CatalogRow, RowExt};
pub use sqlserver::SqlServerCatalog;

/// Whether a driver failure left the connection usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriverErrorKind {
    /// The session is gone (socket closed, TLS failure, fatal server error)
    Connection,
    /// The statement failed but the session is still usable
    Query,
}

/// Failure reported by a driver, with the driver's own message.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct DriverError {
    kind: DriverErrorKind,
    message: String,
}

impl DriverError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self {
            kind: DriverErrorKind::Connection,
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self {
            kind: DriverErrorKind::Query,
            message: message.into(),
        }
    }

    pub fn is_connection(&self) -> bool {
        self.kind == DriverErrorKind::Connection
    }
}

/// An open database session able to run catalog SQL.
///
/// Parameters are bound positionally as text. Every value in a returned row
/// is rendered to text by the driver; SQL NULL becomes `None`.
#[async_trait]
pub trait CatalogConnection: Send {
    /// Runs `sql` with positional text parameters and collects all rows.
    async fn query(
        &mut self,
        sql: &str,
        params: &[&str],
    ) -> std::result::Result<Vec<CatalogRow>, DriverError>;

    /// Closes the session.
    async fn close(self: Box<Self>) -> std::result::Result<(), DriverError>;
}

/// Coarse classification of engine-native types.
///
/// Decides which catalog facts make up the rendered length/precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFamily {
    /// Character data; rendered by character length
    Character,
    /// Exact or approximate numbers; rendered by precision and scale
    Numeric,
    /// Bounded binary data; rendered by byte length
    Binary,
    /// Date/time, LOBs, boolean-like and other types without a size
    Unsized,
}

/// Maps engine-native type names to [`TypeFamily`].
pub trait TypeClassifier {
    /// Returns `None` for type names the mapping table does not know.
    fn classify(&self, type_name: &str) -> Option<TypeFamily>;
}

impl TypeClassifier for Backend {
    fn classify(&self, type_name: &str) -> Option<TypeFamily> {
        match self {
            Backend::Oracle => oracle::type_mapping::classify_oracle_type(type_name),
            Backend::SqlServer => sqlserver::type_mapping::classify_sqlserver_type(type_name),
        }
    }
}

/// One column row as returned by a catalog, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawColumn {
    pub name: String,
    /// Type name shown in the document
    pub data_type: String,
    /// System base type when `data_type` is a user-defined alias
    pub base_type: Option<String>,
    /// Length in characters (character types) or bytes (binary types);
    /// negative means unbounded
    pub length: Option<i64>,
    pub precision: Option<i64>,
    pub scale: Option<i64>,
    pub nullable: bool,
    pub default_value: Option<String>,
    pub comment: Option<String>,
    /// Physical position of the column in the table, 1-based
    pub ordinal: u32,
}

impl RawColumn {
    /// Creates a nullable column with no size facts.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, ordinal: u32) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            base_type: None,
            length: None,
            precision: None,
            scale: None,
            nullable: true,
            default_value: None,
            comment: None,
            ordinal,
        }
    }

    pub fn with_length(mut self, length: i64) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_precision(mut self, precision: i64, scale: Option<i64>) -> Self {
        self.precision = Some(precision);
        self.scale = scale;
        self
    }

    pub fn with_base_type(mut self, base_type: impl Into<String>) -> Self {
        self.base_type = Some(base_type.into());
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// The type name used for classification.
    pub fn classification_type(&self) -> &str {
        self.base_type.as_deref().unwrap_or(&self.data_type)
    }
}

/// One foreign-key column and the column it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawForeignKey {
    pub column: String,
    pub target: ForeignKeyTarget,
}

impl RawForeignKey {
    pub fn new(column: impl Into<String>, target: ForeignKeyTarget) -> Self {
        Self {
            column: column.into(),
            target,
        }
    }
}

/// Everything the catalog reports about one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub name: QualifiedName,
    pub columns: Vec<RawColumn>,
    pub primary_keys: Vec<String>,
    pub foreign_keys: Vec<RawForeignKey>,
}

/// Engine-specific catalog access.
///
/// Implementations hold one open session for their whole lifetime and are
/// driven sequentially. Query failures must be reported through
/// [`TableMdError::from_driver`] so connection-level failures are fatal and
/// everything else stays scoped to one table.
#[async_trait]
pub trait CatalogProvider: Send {
    /// Engine served by this provider.
    fn backend(&self) -> Backend;

    /// Schema (Oracle) or database (SQL Server) the queries are scoped to.
    fn scope(&self) -> &str;

    /// Lists tables in scope matching `pattern`, in catalog order.
    async fn list_matching_tables(&mut self, pattern: &TablePattern)
    -> Result<Vec<QualifiedName>>;

    /// Column rows for `table`, in physical order.
    async fn fetch_columns(&mut self, table: &QualifiedName) -> Result<Vec<RawColumn>>;

    /// Names of the primary-key columns of `table`.
    async fn fetch_primary_keys(&mut self, table: &QualifiedName) -> Result<Vec<String>>;

    /// Foreign-key columns of `table` with their targets.
    async fn fetch_foreign_keys(&mut self, table: &QualifiedName) -> Result<Vec<RawForeignKey>>;

    /// Releases the underlying session.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Runs one catalog statement, classifying driver failures against `subject`.
pub(crate) async fn run_catalog_query(
    connection: &mut dyn CatalogConnection,
    backend: Backend,
    subject: &str,
    context: &str,
    sql: &str,
    params: &[&str],
) -> Result<Vec<CatalogRow>> {
    tracing::trace!(
        "{} catalog query ({}): {} {:?}",
        backend,
        context,
        sql.trim(),
        params
    );
    connection
        .query(sql, params)
        .await
        .map_err(|e| TableMdError::from_driver(backend, subject, context, e))
}

/// Physical column position from a catalog row.
pub(crate) fn decode_ordinal(
    row: &[Option<String>],
    index: usize,
) -> std::result::Result<u32, DriverError> {
    let value = row
        .optional_int(index, "column ordinal")?
        .ok_or_else(|| DriverError::query("catalog returned NULL for column ordinal"))?;
    u32::try_from(value)
        .map_err(|_| DriverError::query(format!("column ordinal out of range: {value}")))
}

/// Runs the three per-table catalog queries.
pub async fn fetch_raw_table(
    provider: &mut dyn CatalogProvider,
    table: &QualifiedName,
) -> Result<RawTable> {
    let columns = provider.fetch_columns(table).await?;
    let primary_keys = provider.fetch_primary_keys(table).await?;
    let foreign_keys = provider.fetch_foreign_keys(table).await?;

    tracing::debug!(
        "Fetched {} columns, {} primary key columns, {} foreign key columns for {}",
        columns.len(),
        primary_keys.len(),
        foreign_keys.len(),
        table
    );

    Ok(RawTable {
        name: table.clone(),
        columns,
        primary_keys,
        foreign_keys,
    })
}

/// Opens a driver session for `config` and wraps it in the matching provider.
///
/// # Errors
/// Returns error if:
/// - the connection cannot be established
/// - the driver for the configured backend is not compiled in
pub async fn connect(config: &BackendConfig) -> Result<Box<dyn CatalogProvider>> {
    match config {
        BackendConfig::Oracle(oracle_config) => {
            #[cfg(feature = "oracle")]
            {
                let connection = oracle::connection::OciConnection::open(oracle_config).await?;
                Ok(Box::new(OracleCatalog::new(
                    Box::new(connection),
                    &oracle_config.schema,
                )))
            }
            #[cfg(not(feature = "oracle"))]
            {
                let _ = oracle_config;
                Err(TableMdError::unsupported_feature(
                    "Oracle catalog",
                    "Compile with --features oracle to enable Oracle support",
                ))
            }
        }
        BackendConfig::SqlServer(sqlserver_config) => {
            #[cfg(feature = "mssql")]
            {
                let connection =
                    sqlserver::connection::TiberiusConnection::open(sqlserver_config).await?;
                Ok(Box::new(SqlServerCatalog::new(
                    Box::new(connection),
                    &sqlserver_config.database,
                    &sqlserver_config.schema,
                )))
            }
            #[cfg(not(feature = "mssql"))]
            {
                let _ = sqlserver_config;
                Err(TableMdError::unsupported_feature(
                    "SQL Server catalog",
                    "Compile with --features mssql to enable SQL Server support",
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_dispatches_type_classification() {
        assert_eq!(
            Backend::Oracle.classify("VARCHAR2"),
            Some(TypeFamily::Character)
        );
        assert_eq!(
            Backend::SqlServer.classify("nvarchar"),
            Some(TypeFamily::Character)
        );
        assert_eq!(Backend::Oracle.classify("nvarchar"), None);
    }

    #[test]
    fn test_raw_column_builder() {
        let column = RawColumn::new("AMOUNT", "NUMBER", 2)
            .with_precision(10, Some(2))
            .not_null()
            .with_default(" 0 ")
            .with_comment("金額");

        assert_eq!(column.precision, Some(10));
        assert_eq!(column.scale, Some(2));
        assert!(!column.nullable);
        assert_eq!(column.default_value.as_deref(), Some(" 0 "));
        assert_eq!(column.classification_type(), "NUMBER");

        let alias = RawColumn::new("CODE", "PhoneNumber", 1).with_base_type("varchar");
        assert_eq!(alias.classification_type(), "varchar");
    }

    #[test]
    fn test_driver_error_kind() {
        assert!(DriverError::connection("gone").is_connection());
        assert!(!DriverError::query("bad sql").is_connection());
        assert_eq!(DriverError::query("bad sql").to_string(), "bad sql");
    }

    #[tokio::test]
    async fn test_fetch_raw_table_collects_all_three_queries() {
        let table = MemoryTable::new("ORDERS")
            .with_column(RawColumn::new("ID", "NUMBER", 1).with_precision(10, Some(0)))
            .with_primary_key("ID")
            .with_foreign_key(RawForeignKey::new(
                "ID",
                ForeignKeyTarget::new("APPS", "PARENT", "ID"),
            ));
        let mut catalog = MemoryCatalog::new(Backend::Oracle, "APPS").with_table(table);

        let name = QualifiedName::new("APPS", "ORDERS");
        let raw = fetch_raw_table(&mut catalog, &name).await.expect("fetch");
        assert_eq!(raw.name, name);
        assert_eq!(raw.columns.len(), 1);
        assert_eq!(raw.primary_keys, vec!["ID".to_string()]);
        assert_eq!(raw.foreign_keys.len(), 1);
    }
}
