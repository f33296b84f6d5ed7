//! CLI commands

pub mod info;
pub mod repo;
pub mod search;

use semver::Version;
use specrepo_repo::{RepositoryManager, Settings};
use std::path::PathBuf;

use crate::error::{CliError, Result};

/// Options shared by every command. Flags override the settings file.
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub repos_dir: Option<PathBuf>,
    pub search_index: Option<PathBuf>,
}

impl GlobalOptions {
    /// Resolve the settings and build a repository manager
    pub fn manager(&self) -> Result<RepositoryManager> {
        let mut settings = match &self.config {
            Some(path) => Settings::load_from(path)?,
            None => Settings::load()?,
        };

        if let Some(dir) = &self.repos_dir {
            settings.repos_dir = Some(dir.clone());
        }
        if let Some(path) = &self.search_index {
            settings.search_index_path = Some(path.clone());
        }

        let config = settings.into_manager_config(tool_version()?)?;
        tracing::debug!("Using repositories in {}", config.repos_dir.display());
        Ok(RepositoryManager::new(config))
    }
}

/// Version of this binary
pub fn tool_version() -> Result<Version> {
    Version::parse(env!("CARGO_PKG_VERSION")).map_err(|e| CliError::internal(e.to_string()))
}
