//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use dasv_pipeline::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Global settings
    #[serde(default)]
    pub settings: Settings,

    /// Pipeline settings
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Global CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table summary
    Table,
    /// JSON artifacts
    Json,
    /// Markdown documents
    Markdown,
}

impl Config {
    /// Default configuration file path (`~/.dasv/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".dasv").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default path is read if
    /// present and built-in defaults are used otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::read(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::read(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn read(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading configuration");
        let contents = fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.pipeline.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

#[cfg(test)]
mod tests {
    use super::*;
    use dasv_domain::ValidationDepth;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.settings.color);
        assert_eq!(config.settings.format, OutputFormat::Table);
        assert_eq!(config.pipeline, PipelineConfig::default());
    }

    #[test]
    fn test_load_partial_file() {
        let file = write_config(
            r#"
            [settings]
            format = "json"

            [pipeline]
            max_concurrent_subjects = 2

            [pipeline.validation]
            depth = "comprehensive"
            "#,
        );

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.settings.format, OutputFormat::Json);
        assert!(config.settings.color);
        assert_eq!(config.pipeline.max_concurrent_subjects, 2);
        assert_eq!(config.pipeline.validation.depth, ValidationDepth::Comprehensive);
        assert_eq!(config.pipeline.discovery.price_tolerance, 0.02);
    }

    #[test]
    fn test_load_invalid_values() {
        let file = write_config(
            r#"
            [pipeline.validation]
            confidence_threshold = 1.5
            "#,
        );
        let err = Config::load(Some(file.path())).unwrap_err();
        assert_eq!(err.status(), dasv_pipeline::RunStatus::ConfigError);
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_malformed_toml() {
        let file = write_config("[settings\ncolor = true");
        assert!(matches!(Config::load(Some(file.path())), Err(CliError::Toml(_))));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = Config::default();
        let parsed: Config = toml::from_str(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }
}
