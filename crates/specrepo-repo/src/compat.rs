//! Tool/repository version compatibility
//!
//! Each repository may declare which tool versions it supports in
//! `specrepo-version.yml` at its root:
//!
//! ```yaml
//! min: 0.18.1
//! max: 2.0
//! last: 0.29.0
//! ```
//!
//! `min`/`max` bound the compatible range; `last` advertises the newest tool
//! release. Every key is optional.

use semver::Version;
use specrepo_core::{parse_version, version_text};

use crate::error::{RepoError, Result, VersionBound};
use crate::source::Repository;

/// Compatibility document, relative to the repository root
pub const VERSION_FILE: &str = "specrepo-version.yml";

const CONFLICT_MARKERS: [&str; 3] = ["<<<<<<<", "=======", ">>>>>>>"];

/// Declared compatibility of a repository
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompatibilityMetadata {
    pub min: Option<Version>,
    pub max: Option<Version>,
    pub last: Option<Version>,
}

impl CompatibilityMetadata {
    /// Parse the YAML document. Conflict markers are the caller's concern.
    pub fn from_yaml(content: &str) -> Self {
        let document: serde_yaml::Value = match serde_yaml::from_str(content) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!("Ignoring unparseable compatibility metadata: {}", e);
                return Self::default();
            }
        };

        let field = |key: &str| -> Option<Version> {
            let text = version_text(document.get(key)?)?;
            parse_version(&text)
                .map_err(|e| tracing::warn!("Ignoring `{}` in compatibility metadata: {}", key, e))
                .ok()
        };

        Self {
            min: field("min"),
            max: field("max"),
            last: field("last"),
        }
    }

    /// The bound `current` falls outside of, if any
    pub fn violated_bound(&self, current: &Version) -> Option<VersionBound> {
        if let Some(min) = &self.min {
            if current < min {
                return Some(VersionBound::Min(min.clone()));
            }
        }
        if let Some(max) = &self.max {
            if current > max {
                return Some(VersionBound::Max(max.clone()));
            }
        }
        None
    }

    pub fn is_compatible(&self, current: &Version) -> bool {
        self.violated_bound(current).is_none()
    }

    /// Whether a tool release newer than `current` is known
    pub fn update_available(&self, current: &Version) -> bool {
        self.last.as_ref().is_some_and(|last| last > current)
    }
}

/// Whether `content` still carries unresolved merge-conflict markers
pub fn has_conflict_markers(content: &str) -> bool {
    content
        .lines()
        .any(|line| CONFLICT_MARKERS.iter().any(|marker| line.starts_with(marker)))
}

/// Gates repositories on the running tool version
#[derive(Debug, Clone)]
pub struct VersionCompatibilityChecker {
    current: Version,
}

impl VersionCompatibilityChecker {
    pub fn new(current: Version) -> Self {
        Self { current }
    }

    pub fn current_version(&self) -> &Version {
        &self.current
    }

    /// Read a repository's compatibility metadata.
    ///
    /// A missing or unreadable document, or a repository without a supported
    /// backend, yields empty metadata. Conflict markers are an error.
    pub fn read_metadata(&self, repo: &Repository) -> Result<CompatibilityMetadata> {
        if !repo.is_git() {
            return Ok(CompatibilityMetadata::default());
        }

        let path = repo.path.join(VERSION_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!("No compatibility metadata for `{}`: {}", repo.name, e);
                return Ok(CompatibilityMetadata::default());
            }
        };

        if has_conflict_markers(&content) {
            return Err(RepoError::MalformedMetadata {
                name: repo.name.clone(),
                path: path.display().to_string(),
            });
        }

        Ok(CompatibilityMetadata::from_yaml(&content))
    }

    pub fn is_compatible(&self, metadata: &CompatibilityMetadata) -> bool {
        metadata.is_compatible(&self.current)
    }

    pub fn update_available(&self, metadata: &CompatibilityMetadata) -> bool {
        metadata.update_available(&self.current)
    }

    /// Fail unless the running tool is within the repository's declared range.
    /// Returns the metadata so callers can check for tool updates.
    pub fn assert_compatible(&self, repo: &Repository) -> Result<CompatibilityMetadata> {
        let metadata = self.read_metadata(repo)?;

        match metadata.violated_bound(&self.current) {
            Some(bound) => Err(RepoError::IncompatibleRepository {
                name: repo.name.clone(),
                bound,
                current: self.current.clone(),
            }),
            None => Ok(metadata),
        }
    }
}
