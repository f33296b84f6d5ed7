//! Read access to the specifications held by a repository
//!
//! The repository layer never parses specification documents itself. It asks
//! a [`SpecStore`] for lightweight summaries (to build search entries) and for
//! the versions of a single package (to materialize package sets).

use semver::Version;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};
use crate::spec::{PackageSpec, SPEC_EXTENSION};
use crate::version::parse_version;

/// Lightweight description of the newest version of one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSummary {
    pub name: String,
    pub version: Version,
    /// Name, summary and description joined with spaces
    pub summary_text: String,
}

/// Source of package specifications for a repository directory
pub trait SpecStore: Send + Sync {
    /// Newest loadable version of every package in the repository, ordered by name
    fn list_package_sets(&self, repo_path: &Path) -> Result<Vec<PackageSummary>>;

    /// Every version of `name` in the repository whose spec loads, ascending.
    /// Empty when the repository does not define the package.
    fn versions(&self, repo_path: &Path, name: &str) -> Result<Vec<Version>>;
}

/// Reject names that are not a single directory below the specs root
pub fn validate_package_name(name: &str) -> Result<()> {
    let single_segment = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !Path::new(name).is_absolute();

    if single_segment {
        Ok(())
    } else {
        Err(CoreError::InvalidPackageName {
            name: name.to_string(),
        })
    }
}

/// Filesystem store for the `[Specs/]<Name>/<version>/<Name>.spec.yaml` layout
#[derive(Debug, Clone, Default)]
pub struct FileSpecStore;

impl FileSpecStore {
    pub fn new() -> Self {
        Self
    }

    /// Directory holding the package directories of a repository
    pub fn specs_root(repo_path: &Path) -> PathBuf {
        let nested = repo_path.join("Specs");
        if nested.is_dir() {
            nested
        } else {
            repo_path.to_path_buf()
        }
    }

    /// Path of the specification document for one version of a package
    pub fn spec_path(repo_path: &Path, name: &str, version: &str) -> PathBuf {
        Self::specs_root(repo_path)
            .join(name)
            .join(version)
            .join(format!("{}.{}", name, SPEC_EXTENSION))
    }

    /// Package directories, sorted by name. Hidden directories are skipped.
    fn package_dirs(root: &Path) -> Result<Vec<(String, PathBuf)>> {
        let mut dirs = Vec::new();

        for entry in std::fs::read_dir(root)? {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();

            if name.starts_with('.') || !path.is_dir() {
                continue;
            }
            dirs.push((name, path));
        }

        dirs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(dirs)
    }

    /// Load the spec of one version directory, logging why it is unusable
    fn load_version(package_dir: &Path, name: &str, dir_name: &str) -> Option<PackageSpec> {
        let spec_path = package_dir
            .join(dir_name)
            .join(format!("{}.{}", name, SPEC_EXTENSION));

        match PackageSpec::load(&spec_path) {
            Ok(spec) => Some(spec),
            Err(e) => {
                tracing::warn!("Skipping {} {}: {}", name, dir_name, e);
                None
            }
        }
    }

    /// Version directories of a package, ascending by version
    fn version_dirs(package_dir: &Path) -> Result<Vec<(Version, String)>> {
        let mut versions = Vec::new();

        for entry in std::fs::read_dir(package_dir)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }

            let dir_name = entry.file_name().to_string_lossy().to_string();
            match parse_version(&dir_name) {
                Ok(version) => versions.push((version, dir_name)),
                Err(e) => {
                    tracing::warn!(
                        "Skipping {}: not a version directory ({})",
                        entry.path().display(),
                        e
                    );
                }
            }
        }

        versions.sort();
        Ok(versions)
    }
}

impl SpecStore for FileSpecStore {
    fn list_package_sets(&self, repo_path: &Path) -> Result<Vec<PackageSummary>> {
        let root = Self::specs_root(repo_path);
        let mut summaries = Vec::new();

        for (name, dir) in Self::package_dirs(&root)? {
            let versions = match Self::version_dirs(&dir) {
                Ok(versions) => versions,
                Err(e) => {
                    tracing::warn!("Skipping package {}: {}", dir.display(), e);
                    continue;
                }
            };

            // Newest version with a loadable spec
            let latest = versions.into_iter().rev().find_map(|(version, dir_name)| {
                Self::load_version(&dir, &name, &dir_name).map(|spec| (version, spec))
            });

            match latest {
                Some((version, spec)) => summaries.push(PackageSummary {
                    summary_text: spec.searchable_text(),
                    name,
                    version,
                }),
                None => tracing::warn!("Skipping package {}: no loadable version", name),
            }
        }

        Ok(summaries)
    }

    fn versions(&self, repo_path: &Path, name: &str) -> Result<Vec<Version>> {
        validate_package_name(name)?;

        let dir = Self::specs_root(repo_path).join(name);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        Ok(Self::version_dirs(&dir)?
            .into_iter()
            .filter(|(_, dir_name)| Self::load_version(&dir, name, dir_name).is_some())
            .map(|(version, _)| version)
            .collect())
    }
}
