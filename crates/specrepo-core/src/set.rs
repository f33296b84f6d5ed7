//! Package sets
//!
//! A package set groups every known version of one package. When several
//! repositories define the same name, a [`MergeStrategy`] decides how their
//! contributions combine into one logical set.

use semver::Version;
use serde::Serialize;

/// Versions of a package contributed by one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetSource {
    /// Repository name
    pub repository: String,

    /// Versions defined by that repository, ascending
    pub versions: Vec<Version>,
}

/// Every known version of one package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageSet {
    pub name: String,
    pub sources: Vec<SetSource>,
}

impl PackageSet {
    pub fn new(name: impl Into<String>, sources: Vec<SetSource>) -> Self {
        Self {
            name: name.into(),
            sources,
        }
    }

    /// Names of the repositories contributing to this set, in order
    pub fn repositories(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.repository.as_str()).collect()
    }

    /// All versions across sources, deduplicated, highest first
    pub fn versions(&self) -> Vec<Version> {
        let mut versions: Vec<Version> = self
            .sources
            .iter()
            .flat_map(|s| s.versions.iter().cloned())
            .collect();
        versions.sort_by(|a, b| b.cmp(a));
        versions.dedup();
        versions
    }

    /// Highest version across sources
    pub fn highest_version(&self) -> Option<&Version> {
        self.sources.iter().flat_map(|s| s.versions.iter()).max()
    }
}

/// Combines same-named contributions from several repositories
pub trait MergeStrategy: Send + Sync {
    /// Merge the contributions for `name`. `parts` is in repository order.
    /// Returns `None` when nothing is left to offer.
    fn merge(&self, name: &str, parts: Vec<SetSource>) -> Option<PackageSet>;
}

/// Keeps every contributing repository
#[derive(Debug, Clone, Copy, Default)]
pub struct UnionMerge;

impl MergeStrategy for UnionMerge {
    fn merge(&self, name: &str, parts: Vec<SetSource>) -> Option<PackageSet> {
        let sources: Vec<_> = parts
            .into_iter()
            .filter(|p| !p.versions.is_empty())
            .collect();

        if sources.is_empty() {
            None
        } else {
            Some(PackageSet::new(name, sources))
        }
    }
}

/// Only the first repository defining the package counts
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstRepositoryWins;

impl MergeStrategy for FirstRepositoryWins {
    fn merge(&self, name: &str, parts: Vec<SetSource>) -> Option<PackageSet> {
        parts
            .into_iter()
            .find(|p| !p.versions.is_empty())
            .map(|source| PackageSet::new(name, vec![source]))
    }
}
