//! SQL Server catalog provider.
//!
//! Reads the `sys.*` catalog views of the connected database, scoped to one
//! schema (`@P1`) so same-named tables in other schemas never merge. Name
//! comparisons follow the database collation; the table listing compares
//! `UPPER(name)` against the uppercased pattern so case-sensitive
//! collations behave like the Oracle side.

#[cfg(feature = "mssql")]
pub mod connection;
pub mod type_mapping;

use super::{
    CatalogConnection, CatalogProvider, CatalogRow, DriverError, RawColumn, RawForeignKey,
    RowExt, decode_ordinal, run_catalog_query,
};
use crate::models::{Backend, ForeignKeyTarget, QualifiedName};
use crate::resolver::TablePattern;
use crate::{Result, TableMdError};
use async_trait::async_trait;

pub(crate) const LIST_TABLES_LIKE_SQL: &str = "
SELECT t.name
FROM sys.tables t
WHERE t.is_ms_shipped = 0
  AND SCHEMA_NAME(t.schema_id) = @P1
  AND UPPER(t.name) LIKE @P2
ORDER BY t.name";

pub(crate) const LIST_TABLES_EXACT_SQL: &str = "
SELECT t.name
FROM sys.tables t
WHERE t.is_ms_shipped = 0
  AND SCHEMA_NAME(t.schema_id) = @P1
  AND UPPER(t.name) = @P2
ORDER BY t.name";

pub(crate) const COLUMNS_SQL: &str = "
SELECT c.name,
       ty.name,
       TYPE_NAME(c.system_type_id),
       CASE WHEN TYPE_NAME(c.system_type_id) IN ('nchar', 'nvarchar') AND c.max_length > 0
            THEN c.max_length / 2
            ELSE c.max_length END,
       CAST(c.precision AS INT),
       CAST(c.scale AS INT),
       CAST(c.is_nullable AS INT),
       dc.definition,
       CAST(ep.value AS NVARCHAR(4000)),
       c.column_id
FROM sys.tables t
JOIN sys.columns c ON t.object_id = c.object_id
JOIN sys.types ty ON c.user_type_id = ty.user_type_id
LEFT JOIN sys.default_constraints dc ON c.default_object_id = dc.object_id
LEFT JOIN sys.extended_properties ep
  ON ep.class = 1
 AND ep.major_id = t.object_id
 AND ep.minor_id = c.column_id
 AND ep.name = 'MS_Description'
WHERE SCHEMA_NAME(t.schema_id) = @P1 AND t.name = @P2
ORDER BY c.column_id";

pub(crate) const PRIMARY_KEYS_SQL: &str = "
SELECT c.name
FROM sys.key_constraints k
JOIN sys.tables t ON t.object_id = k.parent_object_id
JOIN sys.index_columns ic ON ic.object_id = t.object_id AND ic.index_id = k.unique_index_id
JOIN sys.columns c ON c.object_id = t.object_id AND c.column_id = ic.column_id
WHERE k.type = 'PK' AND SCHEMA_NAME(t.schema_id) = @P1 AND t.name = @P2
ORDER BY ic.key_ordinal";

pub(crate) const FOREIGN_KEYS_SQL: &str = "
SELECT pc.name,
       DB_NAME(),
       rt.name,
       rc.name
FROM sys.foreign_keys f
JOIN sys.foreign_key_columns fkc ON f.object_id = fkc.constraint_object_id
JOIN sys.tables pt ON pt.object_id = f.parent_object_id
JOIN sys.columns pc ON pc.object_id = pt.object_id AND pc.column_id = fkc.parent_column_id
JOIN sys.tables rt ON rt.object_id = f.referenced_object_id
JOIN sys.columns rc ON rc.object_id = rt.object_id AND rc.column_id = fkc.referenced_column_id
WHERE SCHEMA_NAME(pt.schema_id) = @P1 AND pt.name = @P2
ORDER BY f.name, fkc.constraint_column_id";

/// Catalog provider for SQL Server, scoped to one schema of the connected
/// database.
pub struct SqlServerCatalog {
    connection: Box<dyn CatalogConnection>,
    database: String,
    schema: String,
}

impl SqlServerCatalog {
    /// Wraps an open session on `database`, documenting tables of `schema`.
    pub fn new(connection: Box<dyn CatalogConnection>, database: &str, schema: &str) -> Self {
        Self {
            connection,
            database: database.trim().to_string(),
            schema: schema.trim().to_string(),
        }
    }

    async fn query_table(
        &mut self,
        table: &QualifiedName,
        context: &str,
        sql: &str,
    ) -> Result<Vec<CatalogRow>> {
        let schema = self.schema.clone();
        run_catalog_query(
            self.connection.as_mut(),
            Backend::SqlServer,
            table.table().as_str(),
            context,
            sql,
            &[schema.as_str(), table.table().as_str()],
        )
        .await
    }
}

fn decode_column(row: &[Option<String>]) -> std::result::Result<RawColumn, DriverError> {
    let data_type = row.required_text(1, "type name")?;
    let base_type = row
        .optional_text(2, "system type name")?
        .filter(|base| !base.eq_ignore_ascii_case(&data_type));

    Ok(RawColumn {
        name: row.required_text(0, "column name")?,
        data_type,
        base_type,
        length: row.optional_int(3, "max_length")?,
        precision: row.optional_int(4, "precision")?,
        scale: row.optional_int(5, "scale")?,
        nullable: row.flag(6, "is_nullable")?,
        default_value: row.optional_text(7, "default definition")?,
        comment: row.optional_text(8, "MS_Description")?,
        ordinal: decode_ordinal(row, 9)?,
    })
}

fn decode_foreign_key(row: &[Option<String>]) -> std::result::Result<RawForeignKey, DriverError> {
    Ok(RawForeignKey::new(
        row.required_text(0, "column name")?,
        ForeignKeyTarget::new(
            row.required_text(1, "referenced database")?,
            row.required_text(2, "referenced table")?,
            row.required_text(3, "referenced column")?,
        ),
    ))
}

fn decode_error(table: &QualifiedName, context: &str, source: DriverError) -> TableMdError {
    TableMdError::from_driver(Backend::SqlServer, table.table().as_str(), context, source)
}

#[async_trait]
impl CatalogProvider for SqlServerCatalog {
    fn backend(&self) -> Backend {
        Backend::SqlServer
    }

    fn scope(&self) -> &str {
        &self.database
    }

    async fn list_matching_tables(
        &mut self,
        pattern: &TablePattern,
    ) -> Result<Vec<QualifiedName>> {
        let sql = if pattern.is_like() {
            LIST_TABLES_LIKE_SQL
        } else {
            LIST_TABLES_EXACT_SQL
        };
        let schema = self.schema.clone();
        let rows = run_catalog_query(
            self.connection.as_mut(),
            Backend::SqlServer,
            pattern.as_str(),
            "listing tables",
            sql,
            &[schema.as_str(), pattern.as_str()],
        )
        .await?;

        rows.iter()
            .map(|row| {
                row.required_text(0, "table name")
                    .map(|name| QualifiedName::new(self.database.as_str(), name))
                    .map_err(|e| {
                        TableMdError::from_driver(
                            Backend::SqlServer,
                            pattern.as_str(),
                            "listing tables",
                            e,
                        )
                    })
            })
            .collect()
    }

    async fn fetch_columns(&mut self, table: &QualifiedName) -> Result<Vec<RawColumn>> {
        let context = "fetching columns";
        let rows = self.query_table(table, context, COLUMNS_SQL).await?;
        rows.iter()
            .map(|row| decode_column(row).map_err(|e| decode_error(table, context, e)))
            .collect()
    }

    async fn fetch_primary_keys(&mut self, table: &QualifiedName) -> Result<Vec<String>> {
        let context = "fetching primary keys";
        let rows = self.query_table(table, context, PRIMARY_KEYS_SQL).await?;
        rows.iter()
            .map(|row| {
                row.required_text(0, "column name")
                    .map_err(|e| decode_error(table, context, e))
            })
            .collect()
    }

    async fn fetch_foreign_keys(&mut self, table: &QualifiedName) -> Result<Vec<RawForeignKey>> {
        let context = "fetching foreign keys";
        let rows = self.query_table(table, context, FOREIGN_KEYS_SQL).await?;
        rows.iter()
            .map(|row| decode_foreign_key(row).map_err(|e| decode_error(table, context, e)))
            .collect()
    }

    async fn close(self: Box<Self>) -> Result<()> {
        tracing::debug!("Closing SQL Server session for database {}", self.database);
        self.connection.close().await.map_err(|e| {
            TableMdError::connection_failed(Backend::SqlServer, "closing session", e)
        })
    }
}
