//! Persistent CLI configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use snapnote_core::util::normalize_text_option;

use crate::error::CliError;

const CONFIG_FILE_NAME: &str = "config.json";
const APP_DIR_NAME: &str = "snapnote";
pub const DB_PATH_ENV: &str = "SNAPNOTE_DB_PATH";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
    #[serde(default)]
    pub default_category: Option<String>,
}

const fn default_config_version() -> u32 {
    1
}

pub fn default_config_path() -> Result<PathBuf, CliError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI config directory".into()))
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join("snapnote.db"))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI data directory".into()))
}

/// Pick the database path: `--db-path`, then `SNAPNOTE_DB_PATH`, then the
/// config file, then the platform data directory.
pub fn resolve_db_path(
    cli_db_path: Option<PathBuf>,
    env_db_path: Option<PathBuf>,
    config: &CliConfig,
) -> Result<PathBuf, CliError> {
    let non_empty = |path: &PathBuf| !path.as_os_str().is_empty();

    if let Some(path) = cli_db_path
        .filter(non_empty)
        .or_else(|| env_db_path.filter(non_empty))
        .or_else(|| config.db_path.clone().filter(non_empty))
    {
        return Ok(path);
    }
    default_db_path()
}

impl CliConfig {
    pub fn load() -> Result<Self, CliError> {
        Self::load_from_path(&default_config_path()?)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, CliError> {
        if !path.exists() {
            return Ok(Self {
                version: default_config_version(),
                ..Self::default()
            });
        }

        let raw = std::fs::read_to_string(path).map_err(|error| {
            CliError::Config(format!(
                "Failed to read config at {}: {error}",
                path.display()
            ))
        })?;
        let mut config = serde_json::from_str::<Self>(&raw).map_err(|error| {
            CliError::Config(format!(
                "Failed to parse config at {}: {error}",
                path.display()
            ))
        })?;
        config.normalize();
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), CliError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                CliError::Config(format!(
                    "Failed to create config directory {}: {error}",
                    parent.display()
                ))
            })?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)?;
        std::fs::write(path, serialized).map_err(|error| {
            CliError::Config(format!(
                "Failed to write config at {}: {error}",
                path.display()
            ))
        })
    }

    /// Directory for binary exports written without `--output`.
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn normalize(&mut self) {
        self.default_category = normalize_text_option(self.default_category.take());
        self.db_path = self.db_path.take().filter(|path| !path.as_os_str().is_empty());
        self.export_dir = self
            .export_dir
            .take()
            .filter(|path| !path.as_os_str().is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_config_loads_defaults() {
        let tmp = tempdir().unwrap();
        let config = CliConfig::load_from_path(&tmp.path().join("config.json")).unwrap();
        assert_eq!(config.version, 1);
        assert!(config.db_path.is_none());
        assert_eq!(config.export_dir(), PathBuf::from("."));
    }

    #[test]
    fn config_roundtrip_normalizes_values() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.json");

        let config = CliConfig {
            version: 1,
            db_path: Some(PathBuf::from("/tmp/notes.db")),
            export_dir: Some(PathBuf::new()),
            default_category: Some("  work ".to_string()),
        };

        config.save_to_path(&path).unwrap();
        let loaded = CliConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded.db_path, Some(PathBuf::from("/tmp/notes.db")));
        assert!(loaded.export_dir.is_none());
        assert_eq!(loaded.default_category.as_deref(), Some("work"));
    }

    #[test]
    fn invalid_config_is_reported() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{ nope").unwrap();

        assert!(matches!(
            CliConfig::load_from_path(&path),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn resolve_db_path_prefers_flag_then_env_then_config() {
        let config = CliConfig {
            db_path: Some(PathBuf::from("config.db")),
            ..CliConfig::default()
        };

        let resolved = resolve_db_path(
            Some(PathBuf::from("flag.db")),
            Some(PathBuf::from("env.db")),
            &config,
        )
        .unwrap();
        assert_eq!(resolved, PathBuf::from("flag.db"));

        let resolved = resolve_db_path(None, Some(PathBuf::from("env.db")), &config).unwrap();
        assert_eq!(resolved, PathBuf::from("env.db"));

        let resolved = resolve_db_path(None, Some(PathBuf::new()), &config).unwrap();
        assert_eq!(resolved, PathBuf::from("config.db"));
    }
}
