//! `key=value` properties files.

use crate::{Result, TableMdError};
use std::collections::HashMap;
use std::time::Duration;

/// Parsed `.properties` content.
///
/// Keys are case-sensitive. Blank values are treated as absent so that a
/// template line such as `ORA_PWD=` falls back to the default or prompt.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    entries: HashMap<String, String>,
}

impl Properties {
    /// Parses properties text.
    ///
    /// A leading UTF-8 byte order mark, blank lines and `#` comments are
    /// skipped. Only the first `=` separates key from value. Lines without
    /// `=` are logged and ignored.
    pub fn parse(text: &str) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut entries = HashMap::new();

        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.split_once('=') {
                Some((key, value)) => {
                    entries.insert(key.trim().to_string(), value.trim().to_string());
                }
                None => {
                    tracing::warn!(
                        "Ignoring properties line {} without '=': {}",
                        index.saturating_add(1),
                        line
                    );
                }
            }
        }

        Self { entries }
    }

    /// Non-blank value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Non-blank value for `key`, or a configuration error naming it.
    ///
    /// # Errors
    /// Returns [`TableMdError::Configuration`] if the key is missing or blank.
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| TableMdError::configuration(format!("{key} is required")))
    }

    /// TCP port for `key`, or `default`.
    ///
    /// # Errors
    /// Returns [`TableMdError::Configuration`] for non-numeric or zero ports.
    pub fn port(&self, key: &str, default: u16) -> Result<u16> {
        let Some(value) = self.get(key) else {
            return Ok(default);
        };
        match value.parse::<u16>() {
            Ok(port) if port > 0 => Ok(port),
            _ => Err(TableMdError::configuration(format!(
                "{key} must be a port number between 1 and 65535, got '{value}'"
            ))),
        }
    }

    /// Boolean for `key`, or `default`.
    ///
    /// Accepts `1/0`, `y/n`, `yes/no` and `true/false` in any case.
    ///
    /// # Errors
    /// Returns [`TableMdError::Configuration`] for any other value.
    pub fn flag(&self, key: &str, default: bool) -> Result<bool> {
        let Some(value) = self.get(key) else {
            return Ok(default);
        };
        match value.to_ascii_lowercase().as_str() {
            "1" | "y" | "yes" | "true" => Ok(true),
            "0" | "n" | "no" | "false" => Ok(false),
            _ => Err(TableMdError::configuration(format!(
                "{key} must be yes or no, got '{value}'"
            ))),
        }
    }

    /// Whole seconds for `key`, or `default`.
    ///
    /// # Errors
    /// Returns [`TableMdError::Configuration`] for non-numeric or zero values.
    pub fn seconds(&self, key: &str, default: Duration) -> Result<Duration> {
        let Some(value) = self.get(key) else {
            return Ok(default);
        };
        match value.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(TableMdError::configuration(format!(
                "{key} must be a positive number of seconds, got '{value}'"
            ))),
        }
    }
}
