//! OCI-backed catalog connection.
//!
//! The `oracle` crate is synchronous, so every call runs on the blocking
//! pool while the async side awaits the join handle.

use super::is_lost_session;
use crate::catalog::{CatalogConnection, CatalogRow, DriverError};
use crate::config::OracleConfig;
use crate::models::Backend;
use crate::{Result, TableMdError};
use async_trait::async_trait;
use oracle::sql_type::ToSql;
use std::sync::Arc;

/// Classifies an `oracle` crate error.
fn classify_error(error: &oracle::Error) -> DriverError {
    match error {
        oracle::Error::OciError(db_error) | oracle::Error::DpiError(db_error)
            if is_lost_session(db_error.code(), db_error.message()) =>
        {
            DriverError::connection(error.to_string())
        }
        _ => DriverError::query(error.to_string()),
    }
}

fn join_error(error: &tokio::task::JoinError) -> DriverError {
    DriverError::connection(format!("OCI worker task failed: {error}"))
}

/// An open OCI session.
pub struct OciConnection {
    connection: Arc<oracle::Connection>,
}

impl OciConnection {
    /// Connects with the configured credentials and connect string.
    ///
    /// # Errors
    /// Returns [`TableMdError::Connection`] if the session cannot be
    /// established within the configured timeout. Catalog queries run
    /// without a call timeout.
    pub async fn open(config: &OracleConfig) -> Result<Self> {
        let username = config.credentials.username().to_string();
        let password = config.credentials.password().unwrap_or_default().to_string();
        let connect_string = config.connect_string();
        let timeout = config.connect_timeout;

        tracing::info!(
            "Connecting to Oracle at {}:{} as {}",
            config.host,
            config.port,
            username
        );

        let task = tokio::task::spawn_blocking(move || {
            oracle::Connection::connect(&username, &password, &connect_string)
        });

        let connection = match tokio::time::timeout(timeout, task).await {
            Err(_) => {
                return Err(TableMdError::connection_failed(
                    Backend::Oracle,
                    format!("no response within {}s", timeout.as_secs()),
                    DriverError::connection("connect timed out"),
                ));
            }
            Ok(Err(e)) => {
                return Err(TableMdError::connection_failed(
                    Backend::Oracle,
                    "opening session",
                    join_error(&e),
                ));
            }
            Ok(Ok(Err(e))) => {
                return Err(TableMdError::connection_failed(
                    Backend::Oracle,
                    "opening session",
                    DriverError::connection(e.to_string()),
                ));
            }
            Ok(Ok(Ok(connection))) => connection,
        };

        tracing::debug!("Oracle session established");
        Ok(Self {
            connection: Arc::new(connection),
        })
    }
}

fn run_query(
    connection: &oracle::Connection,
    sql: &str,
    params: &[String],
) -> std::result::Result<Vec<CatalogRow>, oracle::Error> {
    let binds: Vec<&dyn ToSql> = params.iter().map(|p| p as &dyn ToSql).collect();
    let result_set = connection.query(sql, &binds)?;
    let width = result_set.column_info().len();

    let mut rows = Vec::new();
    for row in result_set {
        let row = row?;
        let values = (0..width)
            .map(|index| row.get::<usize, Option<String>>(index))
            .collect::<std::result::Result<CatalogRow, _>>()?;
        rows.push(values);
    }
    Ok(rows)
}

#[async_trait]
impl CatalogConnection for OciConnection {
    async fn query(
        &mut self,
        sql: &str,
        params: &[&str],
    ) -> std::result::Result<Vec<CatalogRow>, DriverError> {
        let connection = Arc::clone(&self.connection);
        let sql = sql.to_string();
        let params: Vec<String> = params.iter().map(|p| (*p).to_string()).collect();

        tokio::task::spawn_blocking(move || run_query(&connection, &sql, &params))
            .await
            .map_err(|e| join_error(&e))?
            .map_err(|e| classify_error(&e))
    }

    async fn close(self: Box<Self>) -> std::result::Result<(), DriverError> {
        let connection = self.connection;
        tokio::task::spawn_blocking(move || connection.close())
            .await
            .map_err(|e| join_error(&e))?
            .map_err(|e| classify_error(&e))
    }
}
