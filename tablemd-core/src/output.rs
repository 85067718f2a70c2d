//! Document sinks.

use crate::models::QualifiedName;
use crate::{Result, TableMdError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// One rendered table document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub table: QualifiedName,
    /// `<scope>/TABLE_<table>.md`, relative to the output base
    pub relative_path: PathBuf,
    pub text: String,
}

impl Document {
    /// Builds the document for `table` with the conventional file name.
    pub fn new(scope: &str, table: QualifiedName, text: String) -> Self {
        let relative_path = document_path(scope, table.table().as_str());
        Self {
            table,
            relative_path,
            text,
        }
    }
}

/// Relative output path for a table document.
///
/// Path separators and other characters that are not valid in a file name
/// on common platforms are replaced with `_`.
pub fn document_path(scope: &str, table: &str) -> PathBuf {
    let file_name = format!("TABLE_{}.md", sanitize_component(table));
    PathBuf::from(sanitize_component(scope)).join(file_name)
}

fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

/// Destination for rendered documents.
#[async_trait]
pub trait DocumentSink: Send {
    /// Stores one document, replacing any previous version.
    async fn write_document(&mut self, document: &Document) -> Result<PathBuf>;
}

/// Writes documents below a base directory, overwriting existing files.
#[derive(Debug, Clone)]
pub struct FsDocumentSink {
    base: PathBuf,
}

impl FsDocumentSink {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }
}

#[async_trait]
impl DocumentSink for FsDocumentSink {
    async fn write_document(&mut self, document: &Document) -> Result<PathBuf> {
        let path = self.base.join(&document.relative_path);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                TableMdError::io(
                    format!("Failed to create output directory {}", parent.display()),
                    e,
                )
            })?;
        }

        tokio::fs::write(&path, document.text.as_bytes())
            .await
            .map_err(|e| TableMdError::io(format!("Failed to write {}", path.display()), e))?;

        tracing::debug!("Wrote {} bytes to {}", document.text.len(), path.display());
        Ok(path)
    }
}

/// Collects documents in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub documents: Vec<Document>,
}

#[async_trait]
impl DocumentSink for MemorySink {
    async fn write_document(&mut self, document: &Document) -> Result<PathBuf> {
        self.documents.push(document.clone());
        Ok(document.relative_path.clone())
    }
}
