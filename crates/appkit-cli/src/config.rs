//! Configuration loading.
//!
//! Reads `config/default.toml` (or the file given with `--config`) and
//! applies environment overrides. A missing file or section falls back
//! to defaults; a file that does not parse is an error.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment variable overriding `[store] data_dir`.
pub const ENV_DATA_DIR: &str = "APPKIT_DATA_DIR";
/// Environment variable overriding the full database path.
pub const ENV_DATABASE: &str = "APPKIT_DB";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub log: LogConfig,
    pub components: ComponentsConfig,
}

/// The `[store]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    /// Database file name, relative to `data_dir` unless absolute.
    pub database: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            database: PathBuf::from("appkit.db"),
        }
    }
}

impl StoreConfig {
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database)
    }
}

/// The `[log]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// The `[components]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ComponentsConfig {
    /// Component types considered installed by `components check`.
    pub known_types: Vec<String>,
}

impl Config {
    /// Load the file at `path` and apply process environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Parse the file at `path`, or return defaults if it does not exist.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Apply `APPKIT_DATA_DIR` / `APPKIT_DB` as returned by `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.is_empty()) {
            self.store.data_dir = PathBuf::from(dir);
        }
        if let Some(db) = lookup(ENV_DATABASE).filter(|v| !v.is_empty()) {
            self.store.database = PathBuf::from(db);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_file(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.store.database_path(), PathBuf::from("data/appkit.db"));
        assert_eq!(config.log.level, "info");
        assert!(config.components.known_types.is_empty());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[store]\ndata_dir = \"/var/lib/appkit\"\n\n[components]\nknown_types = [\"page\"]\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(
            config.store.database_path(),
            PathBuf::from("/var/lib/appkit/appkit.db")
        );
        assert_eq!(config.log.level, "info");
        assert_eq!(config.components.known_types, vec!["page".to_string()]);
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[store\n").unwrap();
        assert!(Config::from_file(&path).is_err());
    }

    #[test]
    fn env_overrides_file() {
        let mut config = Config::default();
        config.apply_env(|name| match name {
            ENV_DATA_DIR => Some("/tmp/appkit".to_string()),
            ENV_DATABASE => Some("/srv/other.db".to_string()),
            _ => None,
        });
        // An absolute database path wins over the data directory.
        assert_eq!(config.store.database_path(), PathBuf::from("/srv/other.db"));
        assert_eq!(config.store.data_dir, PathBuf::from("/tmp/appkit"));
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = Config::default();
        config.apply_env(|_| Some(String::new()));
        assert_eq!(config.store.database_path(), PathBuf::from("data/appkit.db"));
    }
}
