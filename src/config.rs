//! Settings file handling.
//!
//! Settings come from three layers, later ones winning: built-in defaults, an
//! optional JSON settings file (`--config`), then command-line flags.

use crate::catalog::CatalogSettings;
use crate::cli::Cli;
use crate::producer::CatalogSource;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "collnav";

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Collection doc cache file
    pub cache_path: PathBuf,
    /// Log file; the terminal belongs to the UI
    pub log_file: PathBuf,
    /// Default log level (`RUST_LOG` overrides)
    pub log_level: String,
    pub color: bool,
    /// Collections were catalogued inside an execution environment
    pub execution_environment: bool,
    /// The `collections` directory next to the project
    pub adjacent_collection_dir: PathBuf,
    /// Scan paths under this directory are not listed in the "none found" hint
    pub share_directory: Option<PathBuf>,
    /// Program and arguments printing the catalog document
    pub catalog_command: Vec<String>,
    /// Read the catalog document from this file instead
    pub catalog_file: Option<PathBuf>,
    /// Redraw interval while the producer runs
    pub refresh_ms: u64,
}

impl Default for NavConfig {
    fn default() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(APP_DIR);
        Self {
            cache_path: cache_dir.join("collection_doc_cache.db"),
            log_file: cache_dir.join("collnav.log"),
            log_level: "info".to_string(),
            color: true,
            execution_environment: false,
            adjacent_collection_dir: PathBuf::from("collections"),
            share_directory: None,
            catalog_command: Vec::new(),
            catalog_file: None,
            refresh_ms: 100,
        }
    }
}

impl NavConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse settings JSON")?;

        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize settings to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write settings to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Defaults, then the settings file, then CLI flags.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        Ok(config)
    }

    /// Overlay global CLI flags
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(path) = &cli.cache_path {
            self.cache_path = path.clone();
        }
        if let Some(path) = &cli.log_file {
            self.log_file = path.clone();
        }
        if let Some(level) = &cli.log_level {
            self.log_level = level.clone();
        }
        if cli.no_color {
            self.color = false;
        }
        if cli.execution_environment {
            self.execution_environment = true;
        }
    }

    /// Validate the settings that every command depends on
    pub fn validate(&self) -> Result<()> {
        if self.cache_path.as_os_str().is_empty() {
            anyhow::bail!("Collection doc cache path must be specified");
        }
        if self.cache_path.is_dir() {
            anyhow::bail!(
                "Collection doc cache path {:?} is a directory, try '--cache-path ~/collection_doc_cache.db'",
                self.cache_path
            );
        }
        if self.refresh_ms == 0 {
            anyhow::bail!("Refresh interval must be greater than zero");
        }
        self.log_level
            .parse::<tracing::Level>()
            .map_err(|_| anyhow::anyhow!("Unknown log level '{}'", self.log_level))?;
        Ok(())
    }

    /// The catalog source for the `collections` command.
    ///
    /// Exactly one of `catalog_command` and `catalog_file` must be set.
    pub fn catalog_source(&self) -> Result<CatalogSource> {
        match (&self.catalog_file, self.catalog_command.is_empty()) {
            (Some(_), false) => {
                anyhow::bail!("Specify either a catalog command or a catalog file, not both")
            }
            (Some(path), true) => Ok(CatalogSource::File(path.clone())),
            (None, false) => CatalogSource::from_argv(&self.catalog_command)
                .context("Catalog command is empty"),
            (None, true) => anyhow::bail!(
                "No catalog source: pass '--catalog-file FILE' or '-- COMMAND ARGS...'"
            ),
        }
    }

    /// Settings used to interpret the catalog payload
    pub fn catalog_settings(&self) -> CatalogSettings {
        let adjacent = if self.adjacent_collection_dir.is_absolute() {
            self.adjacent_collection_dir.clone()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(&self.adjacent_collection_dir))
                .unwrap_or_else(|_| self.adjacent_collection_dir.clone())
        };
        CatalogSettings {
            execution_environment: self.execution_environment,
            adjacent_collection_dir: adjacent,
            share_directory: self.share_directory.clone(),
        }
    }

    pub fn refresh(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_default_validates() {
        NavConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"refresh_ms": 250, "color": false}"#).unwrap();
        let config = NavConfig::load_from_file(&path).unwrap();
        assert_eq!(config.refresh_ms, 250);
        assert!(!config.color);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let config = NavConfig {
            catalog_file: Some(PathBuf::from("/tmp/catalog.json")),
            ..NavConfig::default()
        };
        config.save_to_file(&path).unwrap();
        assert_eq!(NavConfig::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = NavConfig {
            refresh_ms: 0,
            ..NavConfig::default()
        };
        assert!(config.validate().is_err());
        let config = NavConfig {
            log_level: "loud".into(),
            ..NavConfig::default()
        };
        assert!(config.validate().is_err());
        let config = NavConfig {
            cache_path: PathBuf::new(),
            ..NavConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_catalog_source_requires_exactly_one() {
        let mut config = NavConfig::default();
        assert!(config.catalog_source().is_err());
        config.catalog_file = Some(PathBuf::from("c.json"));
        assert_eq!(
            config.catalog_source().unwrap(),
            CatalogSource::File(PathBuf::from("c.json"))
        );
        config.catalog_command = vec!["catalog".into()];
        assert!(config.catalog_source().is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from(["collnav", "--no-color", "--cache-path", "/tmp/c.db", "cache", "check"]);
        let config = NavConfig::resolve(&cli).unwrap();
        assert!(!config.color);
        assert_eq!(config.cache_path, PathBuf::from("/tmp/c.db"));
    }
}
