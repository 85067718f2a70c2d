//! Run configuration.
//!
//! Built once from a `.properties` file and passed explicitly to the
//! catalog factory and generator. Nothing reads process-wide state.
//!
//! # Security
//! `Display` and `Debug` output never include passwords.

mod properties;

pub use properties::Properties;

use crate::models::Backend;
use crate::security::Credentials;
use crate::{Result, TableMdError};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default Oracle listener port.
pub const DEFAULT_ORACLE_PORT: u16 = 1521;
/// Default SQL Server port.
pub const DEFAULT_SQLSERVER_PORT: u16 = 1433;
/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default output base directory.
pub const DEFAULT_OUTPUT_BASE: &str = "output";
/// SQL Server schema documented when `MSSQL_SCHEMA` is not set.
pub const DEFAULT_SQLSERVER_SCHEMA: &str = "dbo";
/// ODBC driver name recorded when `MSSQL_DRIVER` is not set.
pub const DEFAULT_MSSQL_DRIVER: &str = "ODBC Driver 18 for SQL Server";

/// How an Oracle database is addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleTarget {
    ServiceName(String),
    Sid(String),
}

/// Oracle connection settings.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub host: String,
    pub port: u16,
    pub credentials: Credentials,
    pub target: OracleTarget,
    /// Owner whose tables are documented
    pub schema: String,
    pub connect_timeout: Duration,
}

impl OracleConfig {
    fn from_properties(props: &Properties, connect_timeout: Duration) -> Result<Self> {
        let host = props.require("ORA_HOST")?.to_string();
        let port = props.port("ORA_PORT", DEFAULT_ORACLE_PORT)?;
        let username = props.require("ORA_USER")?.to_string();
        let password = props.get("ORA_PWD").map(str::to_string);

        // A service name wins when both are set.
        let target = match (props.get("ORA_SERVICE"), props.get("ORA_SID")) {
            (Some(service), _) => OracleTarget::ServiceName(service.to_string()),
            (None, Some(sid)) => OracleTarget::Sid(sid.to_string()),
            (None, None) => {
                return Err(TableMdError::configuration(
                    "ORA_SERVICE or ORA_SID is required",
                ));
            }
        };

        let schema = props.get("ORA_SCHEMA").unwrap_or(&username).to_string();

        Ok(Self {
            host,
            port,
            credentials: Credentials::new(username, password),
            target,
            schema,
            connect_timeout,
        })
    }

    /// Connect string for OCI: EZConnect for a service name, a full
    /// descriptor for a SID.
    pub fn connect_string(&self) -> String {
        match &self.target {
            OracleTarget::ServiceName(service) => {
                format!("//{}:{}/{}", self.host, self.port, service)
            }
            OracleTarget::Sid(sid) => format!(
                "(DESCRIPTION=(CONNECT_TIMEOUT={})(ADDRESS=(PROTOCOL=TCP)(HOST={})(PORT={}))(CONNECT_DATA=(SID={})))",
                self.connect_timeout.as_secs(),
                self.host,
                self.port,
                sid
            ),
        }
    }
}

impl fmt::Display for OracleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match &self.target {
            OracleTarget::ServiceName(service) => format!("service {service}"),
            OracleTarget::Sid(sid) => format!("SID {sid}"),
        };
        write!(
            f,
            "Oracle {}@{}:{} ({}), schema {}",
            self.credentials.username(),
            self.host,
            self.port,
            target,
            self.schema
        )
    }
}

/// SQL Server connection settings.
#[derive(Debug, Clone)]
pub struct SqlServerConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    /// Schema whose tables are listed and documented
    pub schema: String,
    pub credentials: Credentials,
    pub encrypt: bool,
    pub trust_server_certificate: bool,
    /// ODBC driver name; informational only
    pub driver: String,
    pub connect_timeout: Duration,
}

impl SqlServerConfig {
    fn from_properties(props: &Properties, connect_timeout: Duration) -> Result<Self> {
        if props.flag("MSSQL_TRUSTED_CONNECTION", false)? {
            return Err(TableMdError::unsupported_feature(
                "Integrated Windows authentication (MSSQL_TRUSTED_CONNECTION)",
                "SQL Server",
            ));
        }

        Ok(Self {
            host: props.require("MSSQL_SERVER")?.to_string(),
            port: props.port("MSSQL_PORT", DEFAULT_SQLSERVER_PORT)?,
            database: props.require("MSSQL_DBNAME")?.to_string(),
            schema: props
                .get("MSSQL_SCHEMA")
                .unwrap_or(DEFAULT_SQLSERVER_SCHEMA)
                .to_string(),
            credentials: Credentials::new(
                props.require("MSSQL_USER")?.to_string(),
                props.get("MSSQL_PWD").map(str::to_string),
            ),
            encrypt: props.flag("MSSQL_ENCRYPT", true)?,
            trust_server_certificate: props.flag("MSSQL_TRUST_SERVER_CERTIFICATE", true)?,
            driver: props
                .get("MSSQL_DRIVER")
                .unwrap_or(DEFAULT_MSSQL_DRIVER)
                .to_string(),
            connect_timeout,
        })
    }
}

impl fmt::Display for SqlServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SQL Server {}@{}:{}/{} schema {} (encrypt={}, trust_server_certificate={})",
            self.credentials.username(),
            self.host,
            self.port,
            self.database,
            self.schema,
            self.encrypt,
            self.trust_server_certificate
        )
    }
}

/// Backend-specific connection settings.
#[derive(Debug, Clone)]
pub enum BackendConfig {
    Oracle(OracleConfig),
    SqlServer(SqlServerConfig),
}

impl BackendConfig {
    pub fn backend(&self) -> Backend {
        match self {
            Self::Oracle(_) => Backend::Oracle,
            Self::SqlServer(_) => Backend::SqlServer,
        }
    }

    /// Output sub-directory: the Oracle login user or the SQL Server
    /// database name.
    pub fn output_scope(&self) -> &str {
        match self {
            Self::Oracle(config) => config.credentials.username(),
            Self::SqlServer(config) => &config.database,
        }
    }

    pub fn credentials_mut(&mut self) -> &mut Credentials {
        match self {
            Self::Oracle(config) => &mut config.credentials,
            Self::SqlServer(config) => &mut config.credentials,
        }
    }
}

impl fmt::Display for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Oracle(config) => config.fmt(f),
            Self::SqlServer(config) => config.fmt(f),
        }
    }
}

/// Everything one run needs.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub output_base: PathBuf,
}

impl AppConfig {
    /// Builds the configuration from parsed properties.
    ///
    /// # Errors
    /// Returns [`TableMdError::Configuration`] for missing or malformed keys
    /// and [`TableMdError::UnsupportedFeature`] for integrated
    /// authentication.
    pub fn from_properties(props: &Properties) -> Result<Self> {
        let connect_timeout = props.seconds("CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT)?;
        let db_type = props.require("DB_TYPE")?;

        let backend = match db_type.to_ascii_lowercase().as_str() {
            "oracle" => {
                BackendConfig::Oracle(OracleConfig::from_properties(props, connect_timeout)?)
            }
            "sqlserver" => {
                BackendConfig::SqlServer(SqlServerConfig::from_properties(props, connect_timeout)?)
            }
            other => {
                return Err(TableMdError::configuration(format!(
                    "DB_TYPE must be oracle or sqlserver, got '{other}'"
                )));
            }
        };

        Ok(Self {
            backend,
            output_base: PathBuf::from(props.get("OUTPUT_BASE").unwrap_or(DEFAULT_OUTPUT_BASE)),
        })
    }

    /// Reads and parses a properties file.
    ///
    /// # Errors
    /// Returns [`TableMdError::Configuration`] if the file does not exist or
    /// its content is invalid, [`TableMdError::Io`] if it cannot be read.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TableMdError::configuration(format!(
                    "Configuration file not found: {}",
                    path.display()
                ))
            } else {
                TableMdError::io(format!("Failed to read {}", path.display()), e)
            }
        })?;

        let config = Self::from_properties(&Properties::parse(&text))?;
        tracing::debug!("Loaded configuration from {}: {}", path.display(), config.backend);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORACLE: &str = "DB_TYPE=oracle\nORA_HOST=db1\nORA_USER=apps\nORA_PWD=secret\n";
    const SQLSERVER: &str =
        "DB_TYPE=SQLServer\nMSSQL_SERVER=sql1\nMSSQL_DBNAME=Sales\nMSSQL_USER=sa\n";

    fn load(text: &str) -> Result<AppConfig> {
        AppConfig::from_properties(&Properties::parse(text))
    }

    #[test]
    fn test_oracle_defaults() {
        let config = load(&format!("{ORACLE}ORA_SID=ORCL")).expect("config");
        assert_eq!(config.output_base, PathBuf::from("output"));

        let BackendConfig::Oracle(oracle) = &config.backend else {
            panic!("expected Oracle configuration");
        };
        assert_eq!(oracle.port, 1521);
        assert_eq!(oracle.schema, "apps");
        assert_eq!(oracle.target, OracleTarget::Sid("ORCL".to_string()));
        assert_eq!(oracle.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.backend.output_scope(), "apps");
        assert_eq!(config.backend.backend(), Backend::Oracle);
    }

    #[test]
    fn test_oracle_service_wins_over_sid() {
        let config = load(&format!(
            "{ORACLE}ORA_SID=ORCL\nORA_SERVICE=orclpdb\nORA_PORT=1522\nORA_SCHEMA=gl"
        ))
        .expect("config");
        let BackendConfig::Oracle(oracle) = &config.backend else {
            panic!("expected Oracle configuration");
        };
        assert_eq!(oracle.target, OracleTarget::ServiceName("orclpdb".to_string()));
        assert_eq!(oracle.connect_string(), "//db1:1522/orclpdb");
        assert_eq!(oracle.schema, "gl");
        assert_eq!(config.backend.output_scope(), "apps");
    }

    #[test]
    fn test_oracle_sid_descriptor() {
        let config = load(&format!("{ORACLE}ORA_SID=ORCL\nCONNECT_TIMEOUT_SECS=5")).expect("config");
        let BackendConfig::Oracle(oracle) = &config.backend else {
            panic!("expected Oracle configuration");
        };
        assert_eq!(
            oracle.connect_string(),
            "(DESCRIPTION=(CONNECT_TIMEOUT=5)(ADDRESS=(PROTOCOL=TCP)(HOST=db1)(PORT=1521))(CONNECT_DATA=(SID=ORCL)))"
        );
    }

    #[test]
    fn test_oracle_requires_service_or_sid() {
        let err = load(ORACLE).unwrap_err();
        assert!(err.to_string().contains("ORA_SERVICE or ORA_SID"));
    }

    #[test]
    fn test_sqlserver_defaults() {
        let config = load(SQLSERVER).expect("config");
        let BackendConfig::SqlServer(sqlserver) = &config.backend else {
            panic!("expected SQL Server configuration");
        };
        assert_eq!(sqlserver.port, 1433);
        assert!(sqlserver.encrypt);
        assert!(sqlserver.trust_server_certificate);
        assert_eq!(sqlserver.driver, DEFAULT_MSSQL_DRIVER);
        assert_eq!(sqlserver.schema, "dbo");
        assert!(!sqlserver.credentials.has_password());
        assert_eq!(config.backend.output_scope(), "Sales");
    }

    #[test]
    fn test_sqlserver_flags() {
        let config = load(&format!(
            "{SQLSERVER}MSSQL_ENCRYPT=no\nMSSQL_TRUST_SERVER_CERTIFICATE=0\nOUTPUT_BASE=docs"
        ))
        .expect("config");
        let BackendConfig::SqlServer(sqlserver) = &config.backend else {
            panic!("expected SQL Server configuration");
        };
        assert!(!sqlserver.encrypt);
        assert!(!sqlserver.trust_server_certificate);
        assert_eq!(config.output_base, PathBuf::from("docs"));
    }

    #[test]
    fn test_sqlserver_schema_override() {
        let config = load(&format!("{SQLSERVER}MSSQL_SCHEMA=Sales")).expect("config");
        let BackendConfig::SqlServer(sqlserver) = &config.backend else {
            panic!("expected SQL Server configuration");
        };
        assert_eq!(sqlserver.schema, "Sales");
        assert!(sqlserver.to_string().contains("schema Sales"));
        assert_eq!(config.backend.output_scope(), "Sales");
    }

    #[test]
    fn test_trusted_connection_is_rejected() {
        let err = load(&format!("{SQLSERVER}MSSQL_TRUSTED_CONNECTION=yes")).unwrap_err();
        assert!(matches!(err, TableMdError::UnsupportedFeature { .. }));
    }

    #[test]
    fn test_unknown_db_type() {
        let err = load("DB_TYPE=postgres").unwrap_err();
        assert!(err.to_string().contains("postgres"));
        let err = load("").unwrap_err();
        assert!(err.to_string().contains("DB_TYPE"));
    }

    #[test]
    fn test_display_hides_password() {
        let config = load(&format!("{ORACLE}ORA_SID=ORCL")).expect("config");
        let shown = format!("{} {:?}", config.backend, config);
        assert!(shown.contains("apps@db1:1521"));
        assert!(!shown.contains("secret"));
    }

    #[test]
    fn test_load_missing_file_is_configuration_error() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let err = AppConfig::load(&dir.path().join("absent.properties")).unwrap_err();
        assert!(matches!(err, TableMdError::Configuration { .. }));
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("tablemd.properties");
        std::fs::write(&path, SQLSERVER).expect("write");
        let config = AppConfig::load(&path).expect("load");
        assert_eq!(config.backend.backend(), Backend::SqlServer);
    }
}
