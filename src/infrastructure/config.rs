//! Configuration management
//!
//! Settings are read from `$CFGPATCH_CONFIG` or, when unset, from
//! `<config dir>/cfgpatch/config.yaml`. A missing file means defaults.
//!
//! ```yaml
//! backup: true
//! backup_dir: /var/backups/cfgpatch
//! strict: false
//! scoped: false
//! log_level: info
//! ```

use crate::patcher::{BackupPolicy, PatchOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable pointing at an explicit config file
pub const CONFIG_ENV: &str = "CFGPATCH_CONFIG";

/// Errors raised while loading the application configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Config file exists but cannot be read
    #[error("Failed to read config {}: {reason}", .path.display())]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying I/O error message.
        reason: String,
    },

    /// Config file is not valid YAML for the config schema
    #[error("Failed to parse config {}: {reason}", .path.display())]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Parser error message.
        reason: String,
    },
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Take a backup before the first write to each file
    pub backup: bool,
    /// Backup directory; backups go next to the file when unset
    pub backup_dir: Option<PathBuf>,
    /// Reject files assigning a key more than once
    pub strict: bool,
    /// Only match existing assignments inside the target section
    pub scoped: bool,
    /// Log level
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backup: true,
            backup_dir: None,
            strict: false,
            scoped: false,
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Default config file location
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Some(PathBuf::from(path)),
            None => dirs::config_dir().map(|dir| dir.join("cfgpatch").join("config.yaml")),
        }
    }

    /// Loads the config from [`Config::default_path`]
    ///
    /// # Errors
    ///
    /// See [`Config::load_from`].
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Loads the config from `path`; a missing file yields defaults
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` or `ConfigError::Parse`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(config = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        };

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Patch options derived from this config
    #[must_use]
    pub fn patch_options(&self) -> PatchOptions {
        let backup = match (&self.backup_dir, self.backup) {
            (_, false) => BackupPolicy::Disabled,
            (Some(dir), true) => BackupPolicy::Directory(dir.clone()),
            (None, true) => BackupPolicy::NextToFile,
        };

        PatchOptions {
            strict: self.strict,
            scoped: self.scoped,
            backup,
            ..PatchOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.backup);
        assert!(!config.strict);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.patch_options().backup, BackupPolicy::NextToFile);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load_from(&temp_dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "strict: true\nbackup_dir: /var/backups/cfgpatch\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(config.strict);
        assert!(config.backup);

        let options = config.patch_options();
        assert!(options.strict);
        assert_eq!(
            options.backup,
            BackupPolicy::Directory(PathBuf::from("/var/backups/cfgpatch"))
        );
    }

    #[test]
    fn test_backup_disabled_wins_over_dir() {
        let config = Config {
            backup: false,
            backup_dir: Some(PathBuf::from("/tmp")),
            ..Config::default()
        };
        assert_eq!(config.patch_options().backup, BackupPolicy::Disabled);
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "strict: [not, a, bool]\n").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
