//! Repository manager
//!
//! The facade over the repositories root: lists and finds repositories,
//! routes searches through the search index, drives syncs, and gates the
//! master repository on tool compatibility.

use serde::Serialize;
use specrepo_core::{
    FileSpecStore, MergeStrategy, PackageSet, SetSource, SpecStore, UnionMerge,
    validate_package_name,
};

use crate::clock::{Clock, SystemClock};
use crate::compat::{CompatibilityMetadata, VersionCompatibilityChecker};
use crate::config::ManagerConfig;
use crate::error::{RepoError, Result};
use crate::index::{SearchEntry, SearchIndex};
use crate::source::{Repository, RepositoryAggregate};
use crate::sync::{RepositorySyncer, SyncFailure, SyncResult};
use crate::vcs::{GitBackend, VersionControl};

/// How the search index was brought up to date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexRefresh {
    /// Built from scratch (no usable index on disk)
    Generated,
    /// Changed repositories rescanned
    Updated,
    /// Already current
    Fresh,
}

/// Sync outcome of one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryOutcome {
    pub name: String,
    pub result: SyncResult,
}

/// Everything an update pass has to report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    /// One per repository, in name order
    pub outcomes: Vec<RepositoryOutcome>,
    /// Per-repository failures, in name order
    pub warnings: Vec<String>,
    /// Informational messages (e.g. a newer tool release)
    pub notices: Vec<String>,
    /// Progress lines, only collected when output was requested
    pub progress: Vec<String>,
}

impl UpdateReport {
    pub fn any_updated(&self) -> bool {
        self.outcomes.iter().any(|o| o.result.is_updated())
    }

    pub fn outcome(&self, name: &str) -> Option<&SyncResult> {
        self.outcomes.iter().find(|o| o.name == name).map(|o| &o.result)
    }
}

/// Compatibility verdict for one repository
#[derive(Debug)]
pub struct CompatibilityCheck {
    pub repository: Repository,
    /// `None` for repositories without version control, which are not checked
    pub outcome: Option<Result<CompatibilityMetadata>>,
}

impl CompatibilityCheck {
    pub fn is_compatible(&self) -> bool {
        !matches!(self.outcome, Some(Err(_)))
    }
}

/// Manages the spec repositories of one repositories root
pub struct RepositoryManager {
    config: ManagerConfig,
    aggregate: RepositoryAggregate,
    vcs: Box<dyn VersionControl>,
    store: Box<dyn SpecStore>,
    merge: Box<dyn MergeStrategy>,
    clock: Box<dyn Clock>,
    search_index: Option<SearchIndex>,
    /// Whether the in-memory index was checked against the repositories
    index_checked: bool,
}

impl RepositoryManager {
    /// Manager with the git backend, on-disk specs, union merge and system clock
    pub fn new(config: ManagerConfig) -> Self {
        let aggregate = RepositoryAggregate::new(&config.repos_dir);
        Self {
            config,
            aggregate,
            vcs: Box::new(GitBackend::new()),
            store: Box::new(FileSpecStore::new()),
            merge: Box::new(UnionMerge),
            clock: Box::new(SystemClock),
            search_index: None,
            index_checked: false,
        }
    }

    pub fn with_vcs(mut self, vcs: impl VersionControl + 'static) -> Self {
        self.vcs = Box::new(vcs);
        self
    }

    pub fn with_store(mut self, store: impl SpecStore + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    pub fn with_merge_strategy(mut self, merge: impl MergeStrategy + 'static) -> Self {
        self.merge = Box::new(merge);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    // ============ Repositories ============

    /// All repositories, ordered by name
    pub fn all(&self) -> Result<Vec<Repository>> {
        self.aggregate.list()
    }

    pub fn find(&self, name: &str) -> Result<Option<Repository>> {
        self.aggregate.find_by_name(name)
    }

    pub fn master_repository(&self) -> Repository {
        Repository::at(self.config.master_repo_dir())
    }

    /// Whether the master repository exists and has content
    pub fn master_repository_functional(&self) -> bool {
        std::fs::read_dir(self.config.master_repo_dir())
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false)
    }

    pub fn ensure_master_repository_functional(&self) -> Result<()> {
        if self.master_repository_functional() {
            Ok(())
        } else {
            Err(RepoError::MasterRepositoryUnavailable {
                name: self.config.master_name.clone(),
                path: self.config.master_repo_dir().display().to_string(),
            })
        }
    }

    // ============ Search ============

    /// The package set named exactly `name`, merged across repositories
    pub fn search(&self, name: &str) -> Result<Option<PackageSet>> {
        validate_package_name(name)?;
        let mut parts = Vec::new();

        for repo in self.aggregate.list()? {
            match self.store.versions(&repo.path, name) {
                Ok(versions) if !versions.is_empty() => parts.push(SetSource {
                    repository: repo.name,
                    versions,
                }),
                Ok(_) => {}
                Err(e) => tracing::warn!("Skipping repository `{}`: {}", repo.name, e),
            }
        }

        Ok(self.merge.merge(name, parts))
    }

    /// Index entries matching `query`, sorted by name
    pub fn search_entries(&mut self, query: &str, full_text: bool) -> Result<Vec<SearchEntry>> {
        if !self.index_checked || self.search_index.is_none() {
            self.refresh_search_index()?;
        }

        Ok(self
            .search_index
            .as_ref()
            .map(|index| index.search_by_name(query, full_text))
            .unwrap_or_default())
    }

    /// Package sets matching `query`, sorted by name
    pub fn search_by_name(&mut self, query: &str, full_text: bool) -> Result<Vec<PackageSet>> {
        let mut sets = Vec::new();
        for entry in self.search_entries(query, full_text)? {
            if let Some(set) = self.search(&entry.name)? {
                sets.push(set);
            }
        }
        Ok(sets)
    }

    /// The in-memory search index, if one was loaded
    pub fn search_index(&self) -> Option<&SearchIndex> {
        self.search_index.as_ref()
    }

    /// Load, generate or update the search index and persist it when it changed
    pub fn refresh_search_index(&mut self) -> Result<IndexRefresh> {
        let path = self.config.search_index_path.clone();
        let modified = self.aggregate.modification_times()?;
        let current = self.search_index.take().or_else(|| SearchIndex::load(&path));

        let (index, refresh) = match current {
            None => (
                self.aggregate
                    .generate_search_index(self.store.as_ref(), self.clock.as_ref())?,
                IndexRefresh::Generated,
            ),
            Some(index) if index.is_stale(&modified) => (
                self.aggregate.update_search_index(
                    &index,
                    &modified,
                    self.store.as_ref(),
                    self.clock.as_ref(),
                )?,
                IndexRefresh::Updated,
            ),
            Some(index) => (index, IndexRefresh::Fresh),
        };

        tracing::debug!("Search index {:?}", refresh);
        if refresh != IndexRefresh::Fresh {
            if let Err(e) = index.persist(&path) {
                tracing::warn!("Failed to save search index to {}: {}", path.display(), e);
            }
        }

        self.search_index = Some(index);
        self.index_checked = true;
        Ok(refresh)
    }

    // ============ Update ============

    /// Sync the named repository, or every git-backed repository.
    ///
    /// Failed syncs become warnings. After the pass, an updated master
    /// repository is checked for compatibility; a violation fails the call
    /// with [`RepoError::UpdateRejected`], which still carries the report.
    pub fn update(&mut self, repo_name: Option<&str>, show_output: bool) -> Result<UpdateReport> {
        let repos = match repo_name {
            Some(name) => {
                let repo = self
                    .aggregate
                    .find_by_name(name)?
                    .ok_or_else(|| RepoError::RepositoryNotFound {
                        name: name.to_string(),
                    })?;
                vec![repo]
            }
            None => self
                .aggregate
                .list()?
                .into_iter()
                .filter(Repository::is_git)
                .collect(),
        };

        let mut report = UpdateReport::default();
        let syncer = RepositorySyncer::new(self.vcs.as_ref());

        for repo in repos {
            if show_output {
                report.progress.push(format!("Updating spec repo `{}`", repo.name));
            }

            let result = syncer.sync(&repo);
            match &result {
                SyncResult::UpToDate => {
                    if show_output {
                        report.progress.push(format!("`{}` is already up to date", repo.name));
                    }
                }
                SyncResult::Updated { from, to } => {
                    tracing::info!("Updated `{}` ({}..{})", repo.name, from, to);
                    if show_output {
                        report.progress.push(format!("`{}` updated {}..{}", repo.name, from, to));
                    }
                }
                SyncResult::Failed { failure } => {
                    let warning = sync_warning(&repo.name, failure);
                    tracing::warn!("{}", warning);
                    report.warnings.push(warning.to_string());
                }
            }

            report.outcomes.push(RepositoryOutcome {
                name: repo.name,
                result,
            });
        }

        if report.any_updated() {
            self.index_checked = false;
        }

        if report
            .outcome(&self.config.master_name)
            .is_some_and(SyncResult::is_updated)
        {
            let checker = self.compatibility_checker();
            let metadata = match checker.assert_compatible(&self.master_repository()) {
                Ok(metadata) => metadata,
                Err(e) => {
                    return Err(RepoError::UpdateRejected {
                        source: Box::new(e),
                        report: Box::new(report),
                    });
                }
            };

            if checker.update_available(&metadata) {
                if let Some(last) = &metadata.last {
                    report.notices.push(format!(
                        "specrepo {} is available (currently using {})",
                        last,
                        checker.current_version()
                    ));
                }
            }
        }

        Ok(report)
    }

    // ============ Compatibility ============

    pub fn compatibility_checker(&self) -> VersionCompatibilityChecker {
        VersionCompatibilityChecker::new(self.config.tool_version.clone())
    }

    /// Check the named repository, or every repository, against the running tool
    pub fn check_compatibility(&self, repo_name: Option<&str>) -> Result<Vec<CompatibilityCheck>> {
        let repos = match repo_name {
            Some(name) => vec![self.aggregate.find_by_name(name)?.ok_or_else(|| {
                RepoError::RepositoryNotFound {
                    name: name.to_string(),
                }
            })?],
            None => self.aggregate.list()?,
        };

        let checker = self.compatibility_checker();
        Ok(repos
            .into_iter()
            .map(|repository| CompatibilityCheck {
                outcome: repository
                    .is_git()
                    .then(|| checker.assert_compatible(&repository)),
                repository,
            })
            .collect())
    }
}

fn sync_warning(name: &str, failure: &SyncFailure) -> RepoError {
    match failure {
        SyncFailure::UnsupportedBackend => RepoError::UnsupportedBackend {
            name: name.to_string(),
        },
        SyncFailure::Fetch(_) | SyncFailure::Update(_) => RepoError::SyncFailed {
            name: name.to_string(),
            reason: failure.to_string(),
        },
    }
}
