//! Engine configuration.
//!
//! Loaded from JSON; every field has a default, so an empty object `{}` is a
//! valid configuration.
//!
//! ```json
//! {
//!   "path_separator": "/",
//!   "transaction_kinds": ["PAYMENT", "REFUND"],
//!   "incomes_account": "incomes",
//!   "expenses_account": "expenses"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors arising while loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Separates account names in tree paths.
    pub path_separator: char,
    /// Allowed transaction kinds. Empty means any kind is accepted.
    pub transaction_kinds: Vec<String>,
    /// Name of the INCOME account created under each new tree's root.
    pub incomes_account: String,
    /// Name of the EXPENSE account created under each new tree's root.
    pub expenses_account: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path_separator: '/',
            transaction_kinds: Vec::new(),
            incomes_account: "incomes".to_string(),
            expenses_account: "expenses".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path_separator.is_whitespace() {
            return Err(ConfigError::Invalid(
                "path separator must not be whitespace".to_string(),
            ));
        }
        for (field, name) in [
            ("incomes_account", &self.incomes_account),
            ("expenses_account", &self.expenses_account),
        ] {
            if name.is_empty() || name.contains(self.path_separator) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be a non-empty name without '{}'",
                    field, self.path_separator
                )));
            }
        }
        if self.incomes_account == self.expenses_account {
            return Err(ConfigError::Invalid(
                "incomes and expenses accounts must have different names".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a transaction of the given kind may be posted.
    pub fn allows_kind(&self, kind: &str) -> bool {
        self.transaction_kinds.is_empty() || self.transaction_kinds.iter().any(|k| k == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_object() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.path_separator, '/');
        assert!(config.allows_kind("ANYTHING"));
    }

    #[test]
    fn test_partial_config() {
        let config = EngineConfig::from_json_str(
            r#"{ "path_separator": ":", "transaction_kinds": ["PAYMENT"] }"#,
        )
        .unwrap();
        assert_eq!(config.path_separator, ':');
        assert!(config.allows_kind("PAYMENT"));
        assert!(!config.allows_kind("REFUND"));
        assert_eq!(config.incomes_account, "incomes");
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            EngineConfig::from_json_str(r#"{ "path_separator": " " }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{ "incomes_account": "in/comes" }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{ "expenses_account": "incomes" }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            EngineConfig::from_file("/nonexistent/accounting.json"),
            Err(ConfigError::Io { .. })
        ));
    }
}
