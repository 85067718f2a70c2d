//! TDS catalog connection over tiberius.

use crate::catalog::{CatalogConnection, CatalogRow, DriverError};
use crate::config::SqlServerConfig;
use crate::models::Backend;
use crate::{Result, TableMdError};
use async_trait::async_trait;
use tiberius::{AuthMethod, Client, ColumnData, Config, EncryptionLevel, ToSql};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

/// Server errors at or above this severity terminate the session.
const FATAL_SEVERITY: u8 = 20;

/// Classifies a tiberius error.
fn classify_error(error: &tiberius::error::Error) -> DriverError {
    use tiberius::error::Error;

    match error {
        Error::Io { .. } | Error::Tls(_) | Error::Routing { .. } => {
            DriverError::connection(error.to_string())
        }
        Error::Server(token) if token.class() >= FATAL_SEVERITY => {
            DriverError::connection(error.to_string())
        }
        _ => DriverError::query(error.to_string()),
    }
}

/// Renders one TDS value as catalog text.
fn column_text(data: ColumnData<'static>) -> std::result::Result<Option<String>, DriverError> {
    let text = match data {
        ColumnData::U8(v) => v.map(|v| v.to_string()),
        ColumnData::I16(v) => v.map(|v| v.to_string()),
        ColumnData::I32(v) => v.map(|v| v.to_string()),
        ColumnData::I64(v) => v.map(|v| v.to_string()),
        ColumnData::F32(v) => v.map(|v| v.to_string()),
        ColumnData::F64(v) => v.map(|v| v.to_string()),
        ColumnData::Bit(v) => v.map(|v| if v { "1" } else { "0" }.to_string()),
        ColumnData::String(v) => v.map(std::borrow::Cow::into_owned),
        ColumnData::Numeric(v) => v.map(|v| v.to_string()),
        ColumnData::Guid(v) => v.map(|v| v.to_string()),
        other => {
            return Err(DriverError::query(format!(
                "unsupported catalog value type: {other:?}"
            )));
        }
    };
    Ok(text)
}

fn build_config(config: &SqlServerConfig) -> Config {
    let mut tds = Config::new();
    tds.host(&config.host);
    tds.port(config.port);
    tds.database(&config.database);
    tds.authentication(AuthMethod::sql_server(
        config.credentials.username(),
        config.credentials.password().unwrap_or_default(),
    ));
    tds.application_name("tablemd");

    if config.encrypt {
        tds.encryption(EncryptionLevel::Required);
    } else {
        tds.encryption(EncryptionLevel::Off);
    }
    if config.trust_server_certificate {
        tds.trust_cert();
    }
    tds
}

/// An open TDS session.
pub struct TiberiusConnection {
    client: Client<Compat<TcpStream>>,
}

impl TiberiusConnection {
    /// Connects to the configured server and database.
    ///
    /// # Errors
    /// Returns [`TableMdError::Connection`] if TCP, TLS or login fail or
    /// the connect timeout elapses.
    pub async fn open(config: &SqlServerConfig) -> Result<Self> {
        tracing::info!(
            "Connecting to SQL Server at {}:{} database {} as {}",
            config.host,
            config.port,
            config.database,
            config.credentials.username()
        );
        tracing::debug!(
            "MSSQL_DRIVER '{}' is ignored by the native TDS client",
            config.driver
        );

        let tds = build_config(config);
        let connect = async move {
            let tcp = TcpStream::connect(tds.get_addr())
                .await
                .map_err(|e| DriverError::connection(e.to_string()))?;
            tcp.set_nodelay(true)
                .map_err(|e| DriverError::connection(e.to_string()))?;
            Client::connect(tds, tcp.compat_write())
                .await
                .map_err(|e| DriverError::connection(e.to_string()))
        };

        let client = tokio::time::timeout(config.connect_timeout, connect)
            .await
            .map_err(|_| {
                TableMdError::connection_failed(
                    Backend::SqlServer,
                    format!("no response within {}s", config.connect_timeout.as_secs()),
                    DriverError::connection("connect timed out"),
                )
            })?
            .map_err(|e| {
                TableMdError::connection_failed(Backend::SqlServer, "opening session", e)
            })?;

        tracing::debug!("SQL Server session established");
        Ok(Self { client })
    }
}

#[async_trait]
impl CatalogConnection for TiberiusConnection {
    async fn query(
        &mut self,
        sql: &str,
        params: &[&str],
    ) -> std::result::Result<Vec<CatalogRow>, DriverError> {
        let binds: Vec<&dyn ToSql> = params.iter().map(|p| p as &dyn ToSql).collect();
        let rows = self
            .client
            .query(sql, &binds)
            .await
            .map_err(|e| classify_error(&e))?
            .into_first_result()
            .await
            .map_err(|e| classify_error(&e))?;

        rows.into_iter()
            .map(|row| {
                row.into_iter()
                    .map(column_text)
                    .collect::<std::result::Result<CatalogRow, DriverError>>()
            })
            .collect()
    }

    async fn close(self: Box<Self>) -> std::result::Result<(), DriverError> {
        self.client.close().await.map_err(|e| classify_error(&e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    #[test]
    fn test_column_text_conversions() {
        assert_eq!(
            column_text(ColumnData::I16(Some(-1))).unwrap(),
            Some("-1".to_string())
        );
        assert_eq!(
            column_text(ColumnData::Bit(Some(true))).unwrap(),
            Some("1".to_string())
        );
        assert_eq!(
            column_text(ColumnData::String(Some(Cow::Borrowed("說明")))).unwrap(),
            Some("說明".to_string())
        );
        assert_eq!(column_text(ColumnData::I32(None)).unwrap(), None);
    }

    #[test]
    fn test_binary_values_are_rejected() {
        let result = column_text(ColumnData::Binary(Some(Cow::Borrowed(&[1u8, 2][..]))));
        assert!(result.is_err());
    }

    #[test]
    fn test_io_errors_are_connection_level() {
        let error = tiberius::error::Error::Io {
            kind: std::io::ErrorKind::ConnectionReset,
            message: "reset by peer".to_string(),
        };
        assert!(classify_error(&error).is_connection());

        let error = tiberius::error::Error::Protocol("unexpected token".into());
        assert!(!classify_error(&error).is_connection());
    }
}
