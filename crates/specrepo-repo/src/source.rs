//! Spec repositories and the aggregate of all of them
//!
//! Every subdirectory of the repositories root is a [`Repository`]. The
//! [`RepositoryAggregate`] enumerates them on demand (nothing is cached) and
//! builds or refreshes the search index from their contents.

use chrono::{DateTime, Utc};
use serde::Serialize;
use specrepo_core::SpecStore;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::clock::Clock;
use crate::error::Result;
use crate::index::{SearchEntry, SearchIndex};

/// Version control system backing a repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Git,
    /// Plain directory: enumerable, never synced
    Unknown,
}

impl Backend {
    /// Detect the backend of a repository directory
    pub fn detect(path: &Path) -> Self {
        if path.join(".git").exists() {
            Backend::Git
        } else {
            Backend::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Git => "git",
            Backend::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named spec repository on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repository {
    /// Directory name
    pub name: String,
    pub path: PathBuf,
    pub backend: Backend,
}

impl Repository {
    /// Describe the repository at `path`, detecting its backend
    pub fn at(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let backend = Backend::detect(&path);

        Self {
            name,
            path,
            backend,
        }
    }

    pub fn is_git(&self) -> bool {
        self.backend == Backend::Git
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.path.display())
    }
}

/// All repositories under one root directory
#[derive(Debug, Clone)]
pub struct RepositoryAggregate {
    root: PathBuf,
}

impl RepositoryAggregate {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Repositories ordered by name. A missing root has no repositories.
    pub fn list(&self) -> Result<Vec<Repository>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut repos = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            let hidden = entry.file_name().to_string_lossy().starts_with('.');

            if path.is_dir() && !hidden {
                repos.push(Repository::at(path));
            }
        }

        repos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(repos)
    }

    /// Exact-name lookup
    pub fn find_by_name(&self, name: &str) -> Result<Option<Repository>> {
        Ok(self.list()?.into_iter().find(|r| r.name == name))
    }

    /// Search entries of a single repository
    pub fn search_entries(
        &self,
        repo: &Repository,
        store: &dyn SpecStore,
    ) -> Result<Vec<SearchEntry>> {
        let summaries = store.list_package_sets(&repo.path)?;
        Ok(summaries.into_iter().map(SearchEntry::from).collect())
    }

    /// Search entries of every repository, in repository order.
    ///
    /// Repositories that cannot be read are skipped with a warning.
    pub fn all_search_entries(&self, store: &dyn SpecStore) -> Result<Vec<SearchEntry>> {
        let mut entries = Vec::new();
        for (_, scanned) in self.scan(&self.list()?, store) {
            entries.extend(scanned);
        }
        Ok(entries)
    }

    /// Newest content modification per repository name
    pub fn modification_times(&self) -> Result<BTreeMap<String, DateTime<Utc>>> {
        Ok(self
            .list()?
            .into_iter()
            .map(|repo| {
                let modified =
                    latest_modification(&repo.path).unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
                (repo.name, modified)
            })
            .collect())
    }

    /// Build a search index from scratch
    pub fn generate_search_index(
        &self,
        store: &dyn SpecStore,
        clock: &dyn Clock,
    ) -> Result<SearchIndex> {
        // Stamp before scanning so edits made during the scan stay visible as changes
        let built_at = clock.now();
        let repos = self.list()?;
        tracing::debug!("Generating search index for {} repositories", repos.len());

        Ok(SearchIndex::generate(self.scan(&repos, store), built_at))
    }

    /// Refresh `index` by rescanning only the repositories changed since it was built
    pub fn update_search_index(
        &self,
        index: &SearchIndex,
        modified: &BTreeMap<String, DateTime<Utc>>,
        store: &dyn SpecStore,
        clock: &dyn Clock,
    ) -> Result<SearchIndex> {
        let built_at = clock.now();
        let changed = index.modified_since(modified);
        tracing::debug!("Updating search index, rescanning {:?}", changed);

        let repos: Vec<_> = self
            .list()?
            .into_iter()
            .filter(|r| changed.contains(&r.name))
            .collect();

        Ok(index.update(modified.keys(), self.scan(&repos, store), built_at))
    }

    /// Scan each repository. Unreadable ones contribute no entries.
    fn scan(
        &self,
        repos: &[Repository],
        store: &dyn SpecStore,
    ) -> BTreeMap<String, Vec<SearchEntry>> {
        repos
            .iter()
            .map(|repo| {
                let entries = self.search_entries(repo, store).unwrap_or_else(|e| {
                    tracing::warn!("Skipping repository `{}`: {}", repo.name, e);
                    Vec::new()
                });
                (repo.name.clone(), entries)
            })
            .collect()
    }
}

/// Newest modification time of anything beneath `path`, ignoring `.git`
pub fn latest_modification(path: &Path) -> Option<DateTime<Utc>> {
    WalkDir::new(path)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git")
        .filter_map(|e| e.ok())
        .filter_map(|e| e.metadata().ok()?.modified().ok())
        .max()
        .map(DateTime::<Utc>::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use specrepo_core::FileSpecStore;
    use std::fs;
    use tempfile::TempDir;

    fn write_spec(repo: &Path, name: &str, version: &str, summary: &str) {
        let path = FileSpecStore::spec_path(repo, name, version);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            path,
            format!("name: {}\nversion: \"{}\"\nsummary: {}\n", name, version, summary),
        )
        .unwrap();
    }

    fn setup() -> TempDir {
        let dir = TempDir::new().unwrap();
        let master = dir.path().join("master");
        fs::create_dir_all(master.join(".git")).unwrap();
        write_spec(&master, "JSONKit", "1.4", "A Very High Performance JSON library");

        let test_repo = dir.path().join("test_repo");
        write_spec(&test_repo, "BananaLib", "1.0", "Chunky bananas!");

        fs::create_dir(dir.path().join(".hidden")).unwrap();
        fs::write(dir.path().join("README"), "not a repo").unwrap();
        dir
    }

    #[test]
    fn test_list_is_sorted_and_detects_backend() {
        let dir = setup();
        let aggregate = RepositoryAggregate::new(dir.path());

        let repos = aggregate.list().unwrap();
        let names: Vec<_> = repos.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["master", "test_repo"]);
        assert_eq!(repos[0].backend, Backend::Git);
        assert_eq!(repos[1].backend, Backend::Unknown);
    }

    #[test]
    fn test_missing_root() {
        let dir = TempDir::new().unwrap();
        let aggregate = RepositoryAggregate::new(dir.path().join("nope"));
        assert!(aggregate.list().unwrap().is_empty());
    }

    #[test]
    fn test_find_by_name() {
        let dir = setup();
        let aggregate = RepositoryAggregate::new(dir.path());

        let repo = aggregate.find_by_name("test_repo").unwrap().unwrap();
        assert_eq!(repo.path, dir.path().join("test_repo"));
        assert!(aggregate.find_by_name("test").unwrap().is_none());
        assert!(aggregate.find_by_name(".hidden").unwrap().is_none());
    }

    #[test]
    fn test_all_search_entries() {
        let dir = setup();
        let aggregate = RepositoryAggregate::new(dir.path());

        let entries = aggregate.all_search_entries(&FileSpecStore::new()).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["JSONKit", "BananaLib"]);
        assert_eq!(entries[1].normalized_text, "bananalib chunky bananas!");
    }

    #[test]
    fn test_modification_times_cover_every_repository() {
        let dir = setup();
        let aggregate = RepositoryAggregate::new(dir.path());

        let times = aggregate.modification_times().unwrap();
        assert_eq!(times.len(), 2);
        assert!(times["master"] > DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn test_latest_modification_ignores_git_dir() {
        let dir = TempDir::new().unwrap();
        let repo = dir.path().join("repo");
        fs::create_dir_all(repo.join(".git")).unwrap();
        let spec = repo.join("spec.yaml");
        fs::write(&spec, "x").unwrap();

        let past = std::time::SystemTime::now() - std::time::Duration::from_secs(3600);
        fs::File::options().write(true).open(&spec).unwrap().set_modified(past).unwrap();
        let dir_handle = fs::File::open(&repo).unwrap();
        dir_handle.set_modified(past).unwrap();

        let future = std::time::SystemTime::now() + std::time::Duration::from_secs(3600);
        let head = repo.join(".git").join("HEAD");
        fs::write(&head, "ref").unwrap();
        fs::File::options().write(true).open(&head).unwrap().set_modified(future).unwrap();

        let latest = latest_modification(&repo).unwrap();
        assert!(latest < DateTime::<Utc>::from(future));
    }
}
