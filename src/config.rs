//! Category mapping configuration.
//!
//! The mapping tells the organizer which extensions belong to which category
//! folder. It is read from a YAML document with a single recognised key:
//!
//! ```yaml
//! folders:
//!   Videos: [".mp4", ".mov"]
//!   Pictures:
//!     - .jpg
//!     - .png
//! ```
//!
//! Sources are tried in this order, the first one that parses wins:
//! 1. `./config.yml`
//! 2. `~/.config/janitor/config.yml`
//! 3. The built-in default mapping
//!
//! A source that is missing or malformed is skipped without failing the run.
//! Only an explicitly requested file (`--config`) is allowed to fail loudly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// File name looked up in the current directory and in the user config directory.
pub const CONFIG_FILE_NAME: &str = "config.yml";

/// Category name to the extensions that belong to it.
///
/// Sorted by category name, which fixes the order the inverted index is built in.
pub type CategoryMapping = BTreeMap<String, Vec<String>>;

/// Errors raised while loading an explicitly requested configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file does not exist.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but could not be read.
    #[error("IO error reading configuration {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file is not a valid configuration document.
    #[error("Invalid configuration in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// The configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Category folder name to the extensions moved into it.
    #[serde(default)]
    pub folders: CategoryMapping,
}

/// Where a configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Passed on the command line.
    Explicit(PathBuf),
    /// `config.yml` in the current directory.
    Local(PathBuf),
    /// The per-user configuration file.
    User(PathBuf),
    /// Compiled-in defaults.
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Explicit(path) => write!(f, "config from {}", path.display()),
            ConfigSource::Local(_) => write!(f, "config from current directory"),
            ConfigSource::User(path) => {
                write!(f, "config from user directory ({})", path.display())
            }
            ConfigSource::Default => write!(f, "default mappings"),
        }
    }
}

/// A resolved configuration together with its origin.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub source: ConfigSource,
}

impl Config {
    /// Creates a configuration from an existing mapping.
    pub fn new(folders: CategoryMapping) -> Self {
        Self { folders }
    }

    /// Parses a YAML document. An empty document yields an empty mapping.
    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::new(CategoryMapping::new()));
        }
        serde_yaml::from_str(content)
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if the file does not exist,
    /// `ConfigError::Io` if it cannot be read and `ConfigError::Parse`
    /// if it is not valid YAML of the expected shape.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_yaml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolves the configuration from the standard locations.
    pub fn resolve() -> LoadedConfig {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        Self::resolve_from(&local, user_config_path().as_deref())
    }

    /// Resolves the configuration, preferring an explicit file when given.
    ///
    /// # Errors
    ///
    /// Fails only when `explicit` is set and that file cannot be loaded.
    /// Without an explicit path this never fails.
    pub fn resolve_with(explicit: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
        match explicit {
            Some(path) => {
                let config = Self::load_from_file(path)?;
                info!("Using config from {}", path.display());
                Ok(LoadedConfig {
                    config,
                    source: ConfigSource::Explicit(path.to_path_buf()),
                })
            }
            None => Ok(Self::resolve()),
        }
    }

    /// Tries `local`, then `user`, then falls back to the defaults.
    pub fn resolve_from(local: &Path, user: Option<&Path>) -> LoadedConfig {
        match Self::load_from_file(local) {
            Ok(config) => {
                info!("Using config from current directory");
                return LoadedConfig {
                    config,
                    source: ConfigSource::Local(local.to_path_buf()),
                };
            }
            Err(e) => debug!("Skipping local config: {}", e),
        }

        if let Some(user) = user {
            match Self::load_from_file(user) {
                Ok(config) => {
                    info!("Using config from user home directory");
                    return LoadedConfig {
                        config,
                        source: ConfigSource::User(user.to_path_buf()),
                    };
                }
                Err(e) => debug!("Skipping user config: {}", e),
            }
        } else {
            debug!("No home directory, skipping user config");
        }

        info!("No config file found, using default mappings");
        LoadedConfig {
            config: Self::default(),
            source: ConfigSource::Default,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let defaults: [(&str, &[&str]); 6] = [
            (
                "Videos",
                &[
                    ".mp4", ".mov", ".avi", ".mkv", ".wmv", ".webm", ".flv", ".mpg", ".mpeg",
                    ".av1", ".opus", ".ts",
                ],
            ),
            (
                "Music",
                &[
                    ".mp3", ".wav", ".flac", ".aac", ".ogg", ".mpa", ".m4a", ".wma", ".midi",
                ],
            ),
            ("Pictures", &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".svg"]),
            (
                "Documents",
                &[
                    ".pdf", ".docx", ".doc", ".txt", ".md", ".xls", ".xlsx", ".ppt", ".pptx",
                    ".cbz", ".cbr",
                ],
            ),
            (
                "Archives",
                &[".zip", ".tar", ".gz", ".rar", ".7z", ".xz", ".bz2"],
            ),
            (
                "Applications",
                &[
                    ".exe", ".msi", ".apk", ".dmg", ".deb", ".rpm", ".appx", ".msix",
                ],
            ),
        ];

        let folders = defaults
            .iter()
            .map(|(category, exts)| {
                (
                    category.to_string(),
                    exts.iter().map(|ext| ext.to_string()).collect(),
                )
            })
            .collect();

        Self::new(folders)
    }
}

/// Returns `~/.config/janitor/config.yml`, if a home directory is known.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| {
        home.join(".config")
            .join("janitor")
            .join(CONFIG_FILE_NAME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).expect("Failed to write config");
        path
    }

    #[test]
    fn test_default_has_builtin_categories() {
        let config = Config::default();
        let names: Vec<_> = config.folders.keys().map(String::as_str).collect();

        assert_eq!(
            names,
            vec!["Applications", "Archives", "Documents", "Music", "Pictures", "Videos"]
        );
        assert!(config.folders["Videos"].contains(&".mp4".to_string()));
        assert!(config.folders["Pictures"].contains(&".png".to_string()));
    }

    #[test]
    fn test_parse_folders_key() {
        let config = Config::from_yaml_str(
            "folders:\n  Pictures: [\".jpg\", \".png\"]\n  Documents:\n    - .pdf\n",
        )
        .unwrap();

        assert_eq!(config.folders.len(), 2);
        assert_eq!(config.folders["Pictures"], vec![".jpg", ".png"]);
        assert_eq!(config.folders["Documents"], vec![".pdf"]);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config =
            Config::from_yaml_str("theme: dark\nfolders:\n  Docs: [\".pdf\"]\n").unwrap();
        assert_eq!(config.folders["Docs"], vec![".pdf"]);
    }

    #[test]
    fn test_missing_folders_key_is_empty_mapping() {
        let config = Config::from_yaml_str("other: 1\n").unwrap();
        assert!(config.folders.is_empty());
    }

    #[test]
    fn test_empty_document_is_empty_mapping() {
        let config = Config::from_yaml_str("  \n").unwrap();
        assert!(config.folders.is_empty());
    }

    #[test]
    fn test_malformed_document_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "bad.yml", "folders: [unclosed\n");

        let err = Config::load_from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = Config::load_from_file(&dir.path().join("nope.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_resolve_prefers_local() {
        let dir = TempDir::new().unwrap();
        let local = write_config(&dir, "local.yml", "folders:\n  Local: [\".a\"]\n");
        let user = write_config(&dir, "user.yml", "folders:\n  User: [\".b\"]\n");

        let loaded = Config::resolve_from(&local, Some(&user));
        assert_eq!(loaded.source, ConfigSource::Local(local));
        assert!(loaded.config.folders.contains_key("Local"));
    }

    #[test]
    fn test_resolve_falls_through_bad_local_to_user() {
        let dir = TempDir::new().unwrap();
        let local = write_config(&dir, "local.yml", ":::: not yaml [");
        let user = write_config(&dir, "user.yml", "folders:\n  User: [\".b\"]\n");

        let loaded = Config::resolve_from(&local, Some(&user));
        assert_eq!(loaded.source, ConfigSource::User(user));
        assert_eq!(loaded.config.folders["User"], vec![".b"]);
    }

    #[test]
    fn test_resolve_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let local = dir.path().join("missing-local.yml");
        let user = dir.path().join("missing-user.yml");

        let loaded = Config::resolve_from(&local, Some(&user));
        assert_eq!(loaded.source, ConfigSource::Default);
        assert_eq!(loaded.config, Config::default());

        let loaded = Config::resolve_from(&local, None);
        assert_eq!(loaded.source, ConfigSource::Default);
    }

    #[test]
    fn test_resolve_with_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "custom.yml", "folders:\n  Custom: [\".x\"]\n");

        let loaded = Config::resolve_with(Some(&path)).unwrap();
        assert_eq!(loaded.source, ConfigSource::Explicit(path));
        assert!(loaded.config.folders.contains_key("Custom"));
    }

    #[test]
    fn test_resolve_with_explicit_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let result = Config::resolve_with(Some(&dir.path().join("absent.yml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }
}
