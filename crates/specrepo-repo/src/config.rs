//! Configuration
//!
//! [`ManagerConfig`] is the explicit configuration handed to the repository
//! manager. [`Settings`] is the optional user file at
//! `~/.config/specrepo/config.yaml` it is usually resolved from.

use semver::Version;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{RepoError, Result};

/// Name of the primary repository when none is configured
pub const DEFAULT_MASTER_NAME: &str = "master";

/// Everything the repository manager needs to know about its environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Directory whose subdirectories are the spec repositories
    pub repos_dir: PathBuf,

    /// Name of the primary repository (gated on compatibility after sync)
    pub master_name: String,

    /// Location of the persisted search index
    pub search_index_path: PathBuf,

    /// Version of the running tool
    pub tool_version: Version,
}

impl ManagerConfig {
    pub fn new(
        repos_dir: impl Into<PathBuf>,
        search_index_path: impl Into<PathBuf>,
        tool_version: Version,
    ) -> Self {
        Self {
            repos_dir: repos_dir.into(),
            master_name: DEFAULT_MASTER_NAME.to_string(),
            search_index_path: search_index_path.into(),
            tool_version,
        }
    }

    /// Use a different primary repository
    pub fn with_master_name(mut self, name: impl Into<String>) -> Self {
        self.master_name = name.into();
        self
    }

    /// Directory of the primary repository
    pub fn master_repo_dir(&self) -> PathBuf {
        self.repos_dir.join(&self.master_name)
    }
}

/// User settings file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Repositories directory
    #[serde(default)]
    pub repos_dir: Option<PathBuf>,

    /// Primary repository name
    #[serde(default)]
    pub master_name: Option<String>,

    /// Search index cache file
    #[serde(default)]
    pub search_index_path: Option<PathBuf>,
}

impl Settings {
    /// Load settings from the default location, or defaults if absent
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load settings from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Self = serde_yaml::from_str(&content).map_err(|e| RepoError::InvalidConfig {
            message: format!("{}: {}", path.display(), e),
        })?;
        Ok(settings)
    }

    /// Get default settings path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| RepoError::InvalidConfig {
            message: "Could not determine config directory".to_string(),
        })?;
        Ok(config_dir.join("specrepo").join("config.yaml"))
    }

    /// Default repositories directory (`~/.specrepo/repos`)
    pub fn default_repos_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| RepoError::InvalidConfig {
            message: "Could not determine home directory".to_string(),
        })?;
        Ok(home.join(".specrepo").join("repos"))
    }

    /// Default search index location
    pub fn default_search_index_path() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir().ok_or_else(|| RepoError::InvalidConfig {
            message: "Could not determine cache directory".to_string(),
        })?;
        Ok(cache_dir.join("specrepo").join("search_index.yaml"))
    }

    /// Resolve into a manager configuration, filling unset values with defaults
    pub fn into_manager_config(self, tool_version: Version) -> Result<ManagerConfig> {
        let repos_dir = match self.repos_dir {
            Some(dir) => dir,
            None => Self::default_repos_dir()?,
        };
        let search_index_path = match self.search_index_path {
            Some(path) => path,
            None => Self::default_search_index_path()?,
        };

        Ok(ManagerConfig {
            repos_dir,
            master_name: self
                .master_name
                .unwrap_or_else(|| DEFAULT_MASTER_NAME.to_string()),
            search_index_path,
            tool_version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_manager_config_defaults() {
        let config = ManagerConfig::new("/repos", "/cache/index.yaml", Version::new(1, 0, 0));
        assert_eq!(config.master_name, "master");
        assert_eq!(config.master_repo_dir(), PathBuf::from("/repos/master"));

        let config = config.with_master_name("trunk");
        assert_eq!(config.master_repo_dir(), PathBuf::from("/repos/trunk"));
    }

    #[test]
    fn test_settings_camel_case_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "reposDir: /srv/repos\nmasterName: trunk\n").unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(
            loaded,
            Settings {
                repos_dir: Some(PathBuf::from("/srv/repos")),
                master_name: Some("trunk".to_string()),
                search_index_path: None,
            }
        );
    }

    #[test]
    fn test_settings_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "masterName: trunk\n").unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.master_name.as_deref(), Some("trunk"));
        assert!(settings.repos_dir.is_none());
    }

    #[test]
    fn test_settings_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "reposDir: [1, 2").unwrap();

        let err = Settings::load_from(&path).unwrap_err();
        assert!(matches!(err, RepoError::InvalidConfig { .. }));
    }

    #[test]
    fn test_into_manager_config() {
        let settings = Settings {
            repos_dir: Some(PathBuf::from("/srv/repos")),
            master_name: None,
            search_index_path: Some(PathBuf::from("/tmp/index.yaml")),
        };

        let config = settings.into_manager_config(Version::new(0, 4, 0)).unwrap();
        assert_eq!(config.repos_dir, PathBuf::from("/srv/repos"));
        assert_eq!(config.master_name, DEFAULT_MASTER_NAME);
        assert_eq!(config.search_index_path, PathBuf::from("/tmp/index.yaml"));
        assert_eq!(config.tool_version, Version::new(0, 4, 0));
    }
}
