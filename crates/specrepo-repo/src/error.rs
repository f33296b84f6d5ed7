//! Error types for repository operations

use std::fmt;
use thiserror::Error;

use crate::manager::UpdateReport;

/// Which declared compatibility bound the running tool violates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionBound {
    /// Tool is older than the declared `min`
    Min(semver::Version),
    /// Tool is newer than the declared `max`
    Max(semver::Version),
}

impl fmt::Display for VersionBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionBound::Min(v) => write!(f, "specrepo {} or later", v),
            VersionBound::Max(v) => write!(f, "specrepo {} or earlier", v),
        }
    }
}

/// Repository operation errors
#[derive(Debug, Error)]
pub enum RepoError {
    // ============ Configuration Errors ============
    #[error("Repository not found: {name}")]
    RepositoryNotFound { name: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    // ============ Sync Errors ============
    #[error("The `{name}` repository is not backed by a supported version control system")]
    UnsupportedBackend { name: String },

    #[error("Unable to update the `{name}` repository: {reason}")]
    SyncFailed { name: String, reason: String },

    /// The sync pass ran but the updated master repository was rejected
    #[error("{source}")]
    UpdateRejected {
        source: Box<RepoError>,
        /// What the pass did before the rejection
        report: Box<UpdateReport>,
    },

    // ============ Compatibility Errors ============
    #[error("The `{name}` repository has unresolved merge conflicts in {path}")]
    MalformedMetadata { name: String, path: String },

    #[error(
        "The `{name}` repository requires {bound} (currently using {current}). \
         Update specrepo, or check out the appropriate tag in the repository."
    )]
    IncompatibleRepository {
        name: String,
        bound: VersionBound,
        current: semver::Version,
    },

    #[error("The master repository `{name}` is missing or empty at {path}")]
    MasterRepositoryUnavailable { name: String, path: String },

    // ============ Index Errors ============
    #[error("Search index is corrupt: {message}")]
    IndexCorrupt { message: String },

    // ============ Specification Errors ============
    #[error(transparent)]
    Spec(#[from] specrepo_core::CoreError),

    // ============ IO Errors ============
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for repository operations
pub type Result<T> = std::result::Result<T, RepoError>;

impl From<serde_yaml::Error> for RepoError {
    fn from(e: serde_yaml::Error) -> Self {
        RepoError::Serialization(e.to_string())
    }
}

impl From<tempfile::PersistError> for RepoError {
    fn from(e: tempfile::PersistError) -> Self {
        RepoError::Io(e.error)
    }
}
