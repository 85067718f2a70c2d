//! Table name and `LIKE` pattern resolution.

use crate::catalog::CatalogProvider;
use crate::models::QualifiedName;
use crate::{Result, TableMdError};
use regex::Regex;

/// A user-supplied table name or SQL `LIKE` pattern, uppercased.
#[derive(Debug, Clone)]
pub struct TablePattern {
    text: String,
    matcher: Regex,
}

impl TablePattern {
    /// Parses a pattern from the command line.
    ///
    /// # Errors
    /// Returns [`TableMdError::Configuration`] if the pattern is blank.
    pub fn parse(input: &str) -> Result<Self> {
        let text = input.trim().to_uppercase();
        if text.is_empty() {
            return Err(TableMdError::configuration(
                "Table name or pattern must not be empty",
            ));
        }

        let mut expression = String::with_capacity(text.len().saturating_add(8));
        expression.push_str("(?s)^");
        for ch in text.chars() {
            match ch {
                '%' => expression.push_str(".*"),
                '_' => expression.push('.'),
                other => expression.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
            }
        }
        expression.push('$');

        let matcher = Regex::new(&expression).map_err(|e| {
            TableMdError::configuration(format!("Invalid table pattern '{text}': {e}"))
        })?;

        Ok(Self { text, matcher })
    }

    /// The uppercased pattern text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether the pattern uses `LIKE` wildcards.
    pub fn is_like(&self) -> bool {
        self.text.contains(['%', '_'])
    }

    /// Evaluates `LIKE` semantics against a catalog name, ignoring case.
    pub fn matches(&self, name: &str) -> bool {
        self.matcher.is_match(&name.to_uppercase())
    }
}

impl std::fmt::Display for TablePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Expands `pattern` into the matching tables, in catalog order.
///
/// # Errors
/// Returns [`TableMdError::NotFound`] when nothing matches, and whatever
/// the provider reports when the catalog cannot be read.
pub async fn resolve(
    pattern: &TablePattern,
    provider: &mut dyn CatalogProvider,
) -> Result<Vec<QualifiedName>> {
    tracing::debug!(
        "Resolving pattern '{}' ({}) in {} scope {}",
        pattern,
        if pattern.is_like() { "LIKE" } else { "exact" },
        provider.backend(),
        provider.scope()
    );

    let tables = provider.list_matching_tables(pattern).await?;
    if tables.is_empty() {
        return Err(TableMdError::not_found(provider.scope(), pattern.as_str()));
    }

    tracing::info!(
        "Pattern '{}' matched {} table(s) in {}",
        pattern,
        tables.len(),
        provider.scope()
    );
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MemoryCatalog, MemoryTable};
    use crate::models::Backend;

    #[test]
    fn test_parse_uppercases_and_trims() {
        let pattern = TablePattern::parse("  txd2bv01 ").expect("pattern");
        assert_eq!(pattern.as_str(), "TXD2BV01");
        assert!(!pattern.is_like());
    }

    #[test]
    fn test_parse_rejects_blank() {
        assert!(matches!(
            TablePattern::parse("   "),
            Err(TableMdError::Configuration { .. })
        ));
    }

    #[test]
    fn test_like_semantics() {
        let pattern = TablePattern::parse("abc%").expect("pattern");
        assert!(pattern.is_like());
        assert!(pattern.matches("ABC"));
        assert!(pattern.matches("abc123"));
        assert!(!pattern.matches("XABC"));

        let pattern = TablePattern::parse("T_1").expect("pattern");
        assert!(pattern.is_like());
        assert!(pattern.matches("TX1"));
        assert!(!pattern.matches("TXX1"));
        assert!(!pattern.matches("T1"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let pattern = TablePattern::parse("A.B$").expect("pattern");
        assert!(pattern.matches("a.b$"));
        assert!(!pattern.matches("AXB$"));
    }

    #[tokio::test]
    async fn test_resolve_preserves_catalog_order() {
        let mut catalog = MemoryCatalog::new(Backend::SqlServer, "Sales")
            .with_table(MemoryTable::new("ABC2"))
            .with_table(MemoryTable::new("ABC1"));
        let pattern = TablePattern::parse("ABC%").expect("pattern");

        let tables = resolve(&pattern, &mut catalog).await.expect("resolve");
        let names: Vec<_> = tables.iter().map(|t| t.table().as_str()).collect();
        assert_eq!(names, vec!["ABC2", "ABC1"]);
    }

    #[tokio::test]
    async fn test_resolve_reports_not_found() {
        let mut catalog =
            MemoryCatalog::new(Backend::Oracle, "APPS").with_table(MemoryTable::new("XYZ1"));
        let pattern = TablePattern::parse("NOPE").expect("pattern");

        let err = resolve(&pattern, &mut catalog).await.unwrap_err();
        assert_eq!(err.to_string(), "No tables matching 'NOPE' in APPS");
    }
}
