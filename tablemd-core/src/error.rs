//! Error types for catalog introspection and document generation.
//!
//! Database credentials never appear in these errors. Driver messages are
//! carried as [`DriverError`] sources so the CLI can show enough context
//! (backend, table, driver message) for diagnosis without exposing
//! connection parameters.

use crate::catalog::DriverError;
use crate::models::Backend;
use thiserror::Error;

/// Main error type for tablemd operations.
#[derive(Debug, Error)]
pub enum TableMdError {
    /// The database connection could not be established or was lost.
    ///
    /// Fatal for the whole run.
    #[error("{backend} connection failed: {context}")]
    Connection {
        backend: Backend,
        context: String,
        #[source]
        source: DriverError,
    },

    /// The table pattern matched nothing in the configured scope
    #[error("No tables matching '{pattern}' in {scope}")]
    NotFound { scope: String, pattern: String },

    /// A catalog query failed for one table
    #[error("{backend} catalog query failed for table '{table}': {context}")]
    CatalogQuery {
        backend: Backend,
        table: String,
        context: String,
        #[source]
        source: DriverError,
    },

    /// A catalog row could not be mapped onto the schema model
    #[error("Cannot normalize column '{column}' of table '{table}': {reason}")]
    Normalization {
        table: String,
        column: String,
        reason: String,
    },

    /// Configuration or validation error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Unsupported database feature or operation
    #[error("Unsupported operation: {feature} not supported for {backend}")]
    UnsupportedFeature { feature: String, backend: String },

    /// I/O operation failed
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results with TableMdError
pub type Result<T> = std::result::Result<T, TableMdError>;

impl TableMdError {
    /// Creates a connection error with context
    pub fn connection_failed(
        backend: Backend,
        context: impl Into<String>,
        source: DriverError,
    ) -> Self {
        Self::Connection {
            backend,
            context: context.into(),
            source,
        }
    }

    /// Maps a driver failure that happened while querying `table`.
    ///
    /// Connection-level driver failures are promoted to
    /// [`TableMdError::Connection`] so the run stops instead of skipping
    /// the table.
    pub fn from_driver(
        backend: Backend,
        table: impl Into<String>,
        context: impl Into<String>,
        source: DriverError,
    ) -> Self {
        if source.is_connection() {
            Self::Connection {
                backend,
                context: context.into(),
                source,
            }
        } else {
            Self::CatalogQuery {
                backend,
                table: table.into(),
                context: context.into(),
                source,
            }
        }
    }

    /// Creates a not-found error for an unmatched pattern
    pub fn not_found(scope: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::NotFound {
            scope: scope.into(),
            pattern: pattern.into(),
        }
    }

    /// Creates a normalization error for one column
    pub fn normalization(
        table: impl Into<String>,
        column: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Normalization {
            table: table.into(),
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an unsupported feature error
    pub fn unsupported_feature(feature: impl Into<String>, backend: impl Into<String>) -> Self {
        Self::UnsupportedFeature {
            feature: feature.into(),
            backend: backend.into(),
        }
    }

    /// Creates an I/O error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether this error ends the whole run rather than a single table.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::CatalogQuery { .. } | Self::Normalization { .. })
    }
}
