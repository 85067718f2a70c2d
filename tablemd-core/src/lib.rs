//! Core library for tablemd.
//!
//! Turns the system catalog of an Oracle or SQL Server database into one
//! Markdown data-dictionary document per table. The pipeline is:
//! resolve a name or `LIKE` pattern, fetch raw catalog rows, normalize them
//! into a backend-agnostic [`TableSchema`], render the fixed Markdown
//! layout, and hand the document to a [`DocumentSink`].
//!
//! # Security Guarantees
//! - Catalog queries are `SELECT`s against system views only
//! - Credentials are zeroized on drop and never logged or shown in errors
//!
//! # Architecture
//! - All engine-specific SQL lives behind the [`CatalogProvider`] trait
//! - Driver sessions are opaque [`catalog::CatalogConnection`]s created by
//!   the feature-gated [`catalog::connect`] factory
//! - The normalizer and renderer never branch on the backend

pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod normalizer;
pub mod orchestrator;
pub mod output;
pub mod renderer;
pub mod resolver;
pub mod security;

// Re-export commonly used types
pub use catalog::{
    CatalogProvider, RawColumn, RawForeignKey, RawTable, TypeClassifier, TypeFamily,
};
pub use config::{AppConfig, BackendConfig};
pub use error::{Result, TableMdError};
pub use models::{
    Backend, ColumnInfo, ForeignKeyTarget, Identifier, QualifiedName, TableSchema,
};
pub use normalizer::normalize;
pub use orchestrator::{DictionaryGenerator, RunReport, TableFailure};
pub use output::{Document, DocumentSink, FsDocumentSink};
pub use renderer::render;
pub use resolver::{TablePattern, resolve};
