//! Oracle catalog provider.
//!
//! Reads the `ALL_*` data dictionary views, scoped to one owner. The owner
//! is stored uppercase because unquoted Oracle identifiers are uppercase in
//! the dictionary; table names are passed back exactly as `ALL_TABLES`
//! returned them.

#[cfg(feature = "oracle")]
pub mod connection;
pub mod type_mapping;

use super::{
    CatalogConnection, CatalogProvider, DriverError, RawColumn, RawForeignKey, RowExt,
    decode_ordinal, run_catalog_query,
};
use crate::models::{Backend, ForeignKeyTarget, QualifiedName};
use crate::resolver::TablePattern;
use crate::{Result, TableMdError};
use async_trait::async_trait;

/// ORA- codes that mean the session is unusable.
const LOST_SESSION_CODES: &[i32] = &[
    28,    // session killed
    1012,  // not logged on
    3113,  // end-of-file on communication channel
    3114,  // not connected to Oracle
    3135,  // connection lost contact
    12170, // connect timeout
    12537, // connection closed
    12541, // no listener
    12543, // destination host unreachable
    12545, // target host or object does not exist
];

/// ODPI-C errors that mean the session is unusable. These carry code 0.
const LOST_SESSION_PREFIXES: &[&str] = &[
    "DPI-1010", // not connected
    "DPI-1067", // call timeout exceeded
    "DPI-1080", // connection was closed
];

/// Whether a driver error with this code and message leaves the session
/// unusable.
#[cfg_attr(not(feature = "oracle"), allow(dead_code))]
pub(crate) fn is_lost_session(code: i32, message: &str) -> bool {
    let message = message.trim_start();
    LOST_SESSION_CODES.contains(&code)
        || LOST_SESSION_PREFIXES
            .iter()
            .any(|prefix| message.starts_with(prefix))
}

pub(crate) const LIST_TABLES_LIKE_SQL: &str = "
SELECT table_name
FROM all_tables
WHERE owner = :1
  AND UPPER(table_name) LIKE :2
ORDER BY table_name";

pub(crate) const LIST_TABLES_EXACT_SQL: &str = "
SELECT table_name
FROM all_tables
WHERE owner = :1
  AND UPPER(table_name) = :2
ORDER BY table_name";

pub(crate) const COLUMNS_SQL: &str = "
SELECT c.column_name,
       c.data_type,
       CASE WHEN c.char_length > 0 THEN c.char_length ELSE c.data_length END,
       c.data_precision,
       c.data_scale,
       c.nullable,
       c.data_default,
       com.comments,
       c.column_id
FROM all_tab_columns c
LEFT JOIN all_col_comments com
  ON com.owner = c.owner
 AND com.table_name = c.table_name
 AND com.column_name = c.column_name
WHERE c.owner = :1 AND c.table_name = :2
ORDER BY c.column_id";

pub(crate) const PRIMARY_KEYS_SQL: &str = "
SELECT cc.column_name
FROM all_constraints a
JOIN all_cons_columns cc
  ON a.owner = cc.owner AND a.constraint_name = cc.constraint_name
WHERE a.owner = :1 AND a.table_name = :2 AND a.constraint_type = 'P'
ORDER BY cc.position";

pub(crate) const FOREIGN_KEYS_SQL: &str = "
SELECT acc.column_name,
       r.owner,
       r.table_name,
       rcc.column_name
FROM all_constraints a
JOIN all_cons_columns acc
  ON a.owner = acc.owner AND a.constraint_name = acc.constraint_name
JOIN all_constraints r
  ON r.owner = a.r_owner AND r.constraint_name = a.r_constraint_name
JOIN all_cons_columns rcc
  ON r.owner = rcc.owner
 AND r.constraint_name = rcc.constraint_name
 AND rcc.position = acc.position
WHERE a.owner = :1 AND a.table_name = :2 AND a.constraint_type = 'R'
ORDER BY a.constraint_name, acc.position";

/// Catalog provider for Oracle, scoped to one schema owner.
pub struct OracleCatalog {
    connection: Box<dyn CatalogConnection>,
    owner: String,
}

impl OracleCatalog {
    /// Wraps an open session; `schema` is uppercased.
    pub fn new(connection: Box<dyn CatalogConnection>, schema: &str) -> Self {
        Self {
            connection,
            owner: schema.trim().to_uppercase(),
        }
    }

    async fn query_table(
        &mut self,
        table: &QualifiedName,
        context: &str,
        sql: &str,
    ) -> Result<Vec<super::CatalogRow>> {
        let owner = self.owner.clone();
        run_catalog_query(
            self.connection.as_mut(),
            Backend::Oracle,
            table.table().as_str(),
            context,
            sql,
            &[owner.as_str(), table.table().as_str()],
        )
        .await
    }
}

fn decode_column(row: &[Option<String>]) -> std::result::Result<RawColumn, DriverError> {
    Ok(RawColumn {
        name: row.required_text(0, "column_name")?,
        data_type: row.required_text(1, "data_type")?,
        base_type: None,
        length: row.optional_int(2, "char_length")?,
        precision: row.optional_int(3, "data_precision")?,
        scale: row.optional_int(4, "data_scale")?,
        nullable: row.flag(5, "nullable")?,
        default_value: row.optional_text(6, "data_default")?,
        comment: row.optional_text(7, "comments")?,
        ordinal: decode_ordinal(row, 8)?,
    })
}

fn decode_foreign_key(row: &[Option<String>]) -> std::result::Result<RawForeignKey, DriverError> {
    Ok(RawForeignKey::new(
        row.required_text(0, "column_name")?,
        ForeignKeyTarget::new(
            row.required_text(1, "r_owner")?,
            row.required_text(2, "r_table_name")?,
            row.required_text(3, "r_column_name")?,
        ),
    ))
}

fn decode_error(table: &QualifiedName, context: &str, source: DriverError) -> TableMdError {
    TableMdError::from_driver(Backend::Oracle, table.table().as_str(), context, source)
}

#[async_trait]
impl CatalogProvider for OracleCatalog {
    fn backend(&self) -> Backend {
        Backend::Oracle
    }

    fn scope(&self) -> &str {
        &self.owner
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
        let owner = self.owner.clone();
        let rows = run_catalog_query(
            self.connection.as_mut(),
            Backend::Oracle,
            pattern.as_str(),
            "listing tables",
            sql,
            &[owner.as_str(), pattern.as_str()],
        )
        .await?;

        rows.iter()
            .map(|row| {
                row.required_text(0, "table_name")
                    .map(|name| QualifiedName::new(owner.as_str(), name))
                    .map_err(|e| {
                        TableMdError::from_driver(
                            Backend::Oracle,
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
                row.required_text(0, "column_name")
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
        tracing::debug!("Closing Oracle session for owner {}", self.owner);
        self.connection.close().await.map_err(|e| {
            TableMdError::connection_failed(Backend::Oracle, "closing session", e)
        })
    }
}
