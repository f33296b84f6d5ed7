//! Specification documents
//!
//! A specification describes one version of one package. Repositories store
//! them as `<Name>/<version>/<Name>.spec.yaml`.

use semver::Version;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CoreError, Result};
use crate::version::{deserialize_version_text, parse_version};

/// File extension of specification documents
pub const SPEC_EXTENSION: &str = "spec.yaml";

/// A single package specification
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageSpec {
    /// Package name
    pub name: String,

    /// Version as written in the document (may be lenient, e.g. `1.0`)
    #[serde(deserialize_with = "deserialize_version_text")]
    pub version: String,

    /// One-line summary
    #[serde(default)]
    pub summary: Option<String>,

    /// Longer description
    #[serde(default)]
    pub description: Option<String>,

    /// Project homepage
    #[serde(default)]
    pub homepage: Option<String>,

    /// Authors
    #[serde(default)]
    pub authors: Vec<String>,
}

impl PackageSpec {
    /// Parse a specification from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let spec: Self = serde_yaml::from_str(yaml)?;
        Ok(spec)
    }

    /// Load a specification document from disk
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::SpecNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        let spec = Self::from_yaml(&content).map_err(|e| CoreError::InvalidSpec {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        if spec.name.trim().is_empty() {
            return Err(CoreError::InvalidSpec {
                path: path.display().to_string(),
                message: "name must not be empty".to_string(),
            });
        }

        Ok(spec)
    }

    /// Parsed semantic version
    pub fn semver(&self) -> Result<Version> {
        parse_version(&self.version)
    }

    /// Text used for full-text search: name, summary and description
    pub fn searchable_text(&self) -> String {
        [
            Some(self.name.as_str()),
            self.summary.as_deref(),
            self.description.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
    }
}
