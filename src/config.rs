//! Settings for the command-line front end.
//!
//! Loaded once at startup and passed to whatever needs it.

use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Currency code shown for groups that have none.
    #[serde(default = "default_currency")]
    pub default_currency: String,

    #[serde(default)]
    pub output_format: OutputFormat,

    /// Location of the JSON store file, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            default_currency: default_currency(),
            output_format: OutputFormat::default(),
            store_path: None,
        }
    }
}

impl Settings {
    /// Reads settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            LedgerError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            LedgerError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Reads settings from `path` if one is given, otherwise defaults.
    ///
    /// A given path must exist.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.default_currency, "USD");
        assert_eq!(settings.output_format, OutputFormat::Csv);
        assert!(settings.store_path.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, r#"{"output_format": "json"}"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.output_format, OutputFormat::Json);
        assert_eq!(settings.default_currency, "USD");
    }

    #[test]
    fn test_no_path_uses_defaults() {
        assert_eq!(Settings::load_or_default(None).unwrap(), Settings::default());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.json");

        assert!(matches!(
            Settings::load_or_default(Some(&path)),
            Err(LedgerError::Config(_))
        ));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(Settings::load(&path), Err(LedgerError::Config(_))));
    }
}
