//! Importer configuration.
//!
//! Read from a TOML file; every section and key is optional. A few keys can
//! be overridden from the environment so deployments can keep one file.
//!
//! # Example
//!
//! ```toml
//! [store]
//! url = "http://clickhouse:8123"
//! database = "majorka"
//! connect_timeout_ms = 2000
//! read_timeout_ms = 30000
//!
//! [bus]
//! url = "redis://redis:6379/0"
//!
//! [import]
//! entities = ["Campaign", "Offer", "Conversions", "Hits"]
//! batch_limit = 50000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use majorka_storage::{StoreSettings, DEFAULT_DATABASE, DEFAULT_TIMEOUT, DEFAULT_URL};
use serde::{Deserialize, Serialize};

use crate::models::KNOWN_KINDS;

pub const DEFAULT_BUS_URL: &str = "redis://localhost:6379/0";

/// Environment variables that override file settings.
pub const ENV_STORE_URL: &str = "MAJORKA_STORE_URL";
pub const ENV_STORE_DATABASE: &str = "MAJORKA_STORE_DATABASE";
pub const ENV_BUS_URL: &str = "MAJORKA_BUS_URL";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse '{}': {message}", .path.display())]
    Parse { path: PathBuf, message: String },
}

// ── Types ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub store: StoreConfig,
    pub bus: BusConfig,
    pub import: ImportSection,
}

/// `[store]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub url: String,
    pub database: String,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let timeout = DEFAULT_TIMEOUT.as_millis() as u64;
        StoreConfig {
            url: DEFAULT_URL.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            connect_timeout_ms: timeout,
            read_timeout_ms: timeout,
        }
    }
}

/// `[bus]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub url: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        BusConfig {
            url: DEFAULT_BUS_URL.to_string(),
        }
    }
}

/// `[import]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSection {
    /// Kinds to import, in order.
    pub entities: Vec<String>,
    /// Records per kind per pass; absent or zero means unlimited.
    pub batch_limit: Option<u64>,
}

impl Default for ImportSection {
    fn default() -> Self {
        ImportSection {
            entities: KNOWN_KINDS.iter().map(|k| k.to_string()).collect(),
            batch_limit: None,
        }
    }
}

// ── Functions ─────────────────────────────────────────────────────────────────

/// Read and parse a config file.
pub fn read_config(path: &Path) -> Result<ImportConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

impl ImportConfig {
    /// Apply overrides looked up through `lookup`, typically
    /// `|key| std::env::var(key).ok()`.
    pub fn apply_env<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        if let Some(url) = lookup(ENV_STORE_URL) {
            self.store.url = url;
        }
        if let Some(database) = lookup(ENV_STORE_DATABASE) {
            self.store.database = database;
        }
        if let Some(url) = lookup(ENV_BUS_URL) {
            self.bus.url = url;
        }
    }

    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            url: self.store.url.clone(),
            database: self.store.database.clone(),
            connect_timeout: Duration::from_millis(self.store.connect_timeout_ms),
            read_timeout: Duration::from_millis(self.store.read_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn empty_file_gives_defaults() {
        let file = write_config("");
        let config = read_config(file.path()).unwrap();
        assert_eq!(config, ImportConfig::default());
        assert_eq!(config.import.entities, vec!["Campaign", "Offer", "Conversions", "Hits"]);
        assert_eq!(config.store_settings(), StoreSettings::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let file = write_config(
            "[store]\nurl = \"http://ch:8123\"\nread_timeout_ms = 30000\n\n[import]\nentities = [\"Hits\"]\nbatch_limit = 500\n",
        );
        let config = read_config(file.path()).unwrap();
        assert_eq!(config.store.url, "http://ch:8123");
        assert_eq!(config.store.database, "majorka");
        assert_eq!(config.bus.url, DEFAULT_BUS_URL);
        assert_eq!(config.import.entities, vec!["Hits"]);
        assert_eq!(config.import.batch_limit, Some(500));
        let settings = config.store_settings();
        assert_eq!(settings.read_timeout, Duration::from_secs(30));
        assert_eq!(settings.connect_timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn environment_overrides_file() {
        let mut config = ImportConfig::default();
        config.apply_env(|key| match key {
            ENV_STORE_DATABASE => Some("staging".to_string()),
            ENV_BUS_URL => Some("redis://bus:6379/2".to_string()),
            _ => None,
        });
        assert_eq!(config.store.url, DEFAULT_URL);
        assert_eq!(config.store.database, "staging");
        assert_eq!(config.bus.url, "redis://bus:6379/2");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = read_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().starts_with("could not read '"));
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let file = write_config("[store\nurl = 1");
        assert!(matches!(
            read_config(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }
}
