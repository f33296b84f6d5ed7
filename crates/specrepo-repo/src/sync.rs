//! Repository synchronization
//!
//! A sync fetches the upstream of a git-backed repository and fast-forwards
//! its working copy. Failures are values, not errors: one unreachable mirror
//! must not stop the rest of an update.

use serde::Serialize;
use std::fmt;

use crate::source::{Backend, Repository};
use crate::vcs::{FastForward, VersionControl};

/// Why a repository could not be synced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "camelCase")]
pub enum SyncFailure {
    /// Not backed by a version control system the tool can update
    UnsupportedBackend,
    /// Fetching from upstream failed; the working copy is untouched
    Fetch(String),
    /// Fast-forwarding failed (e.g. diverged history)
    Update(String),
}

impl fmt::Display for SyncFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncFailure::UnsupportedBackend => {
                f.write_str("not backed by a supported version control system")
            }
            SyncFailure::Fetch(message) => write!(f, "fetch failed: {}", message),
            SyncFailure::Update(message) => write!(f, "update failed: {}", message),
        }
    }
}

/// Outcome of syncing one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SyncResult {
    UpToDate,
    Updated { from: String, to: String },
    Failed { failure: SyncFailure },
}

impl SyncResult {
    pub fn is_updated(&self) -> bool {
        matches!(self, SyncResult::Updated { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SyncResult::Failed { .. })
    }

    fn failed(failure: SyncFailure) -> Self {
        SyncResult::Failed { failure }
    }
}

impl fmt::Display for SyncResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncResult::UpToDate => f.write_str("already up to date"),
            SyncResult::Updated { from, to } => write!(f, "updated {}..{}", from, to),
            SyncResult::Failed { failure } => write!(f, "{}", failure),
        }
    }
}

/// Syncs repositories through a version control backend
pub struct RepositorySyncer<'a> {
    vcs: &'a dyn VersionControl,
}

impl<'a> RepositorySyncer<'a> {
    pub fn new(vcs: &'a dyn VersionControl) -> Self {
        Self { vcs }
    }

    /// Fetch then fast-forward. Never touches the network for non-git repositories.
    pub fn sync(&self, repo: &Repository) -> SyncResult {
        match repo.backend {
            Backend::Git => {}
            Backend::Unknown => return SyncResult::failed(SyncFailure::UnsupportedBackend),
        }

        if !self.vcs.is_repo(&repo.path) {
            return SyncResult::failed(SyncFailure::UnsupportedBackend);
        }

        tracing::debug!("Syncing repository `{}`", repo.name);

        if let Err(e) = self.vcs.fetch(&repo.path) {
            return SyncResult::failed(SyncFailure::Fetch(e.message));
        }

        match self.vcs.fast_forward_update(&repo.path) {
            Ok(FastForward::NoChange) => SyncResult::UpToDate,
            Ok(FastForward::Changed { from, to }) => SyncResult::Updated { from, to },
            Err(e) => SyncResult::failed(SyncFailure::Update(e.message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::{BackendError, BackendResult};
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Scripted backend recording the calls it receives
    struct ScriptedVcs {
        is_repo: bool,
        fetch: BackendResult<()>,
        update: BackendResult<FastForward>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl ScriptedVcs {
        fn new(fetch: BackendResult<()>, update: BackendResult<FastForward>) -> Self {
            Self {
                is_repo: true,
                fetch,
                update,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl VersionControl for ScriptedVcs {
        fn is_repo(&self, _path: &Path) -> bool {
            self.is_repo
        }

        fn fetch(&self, _path: &Path) -> BackendResult<()> {
            self.calls.lock().unwrap().push("fetch");
            self.fetch.clone()
        }

        fn fast_forward_update(&self, _path: &Path) -> BackendResult<FastForward> {
            self.calls.lock().unwrap().push("update");
            self.update.clone()
        }
    }

    fn git_repo(dir: &TempDir) -> Repository {
        let path = dir.path().join("master");
        std::fs::create_dir_all(path.join(".git")).unwrap();
        Repository::at(path)
    }

    #[test]
    fn test_up_to_date() {
        let dir = TempDir::new().unwrap();
        let vcs = ScriptedVcs::new(Ok(()), Ok(FastForward::NoChange));

        let result = RepositorySyncer::new(&vcs).sync(&git_repo(&dir));

        assert_eq!(result, SyncResult::UpToDate);
        assert_eq!(vcs.calls(), vec!["fetch", "update"]);
    }

    #[test]
    fn test_updated() {
        let dir = TempDir::new().unwrap();
        let changed = FastForward::Changed {
            from: "1234567".to_string(),
            to: "89abcde".to_string(),
        };
        let vcs = ScriptedVcs::new(Ok(()), Ok(changed));

        let result = RepositorySyncer::new(&vcs).sync(&git_repo(&dir));

        assert!(result.is_updated());
        assert_eq!(result.to_string(), "updated 1234567..89abcde");
    }

    #[test]
    fn test_fetch_failure_skips_update() {
        let dir = TempDir::new().unwrap();
        let vcs = ScriptedVcs::new(
            Err(BackendError::new("could not resolve host")),
            Ok(FastForward::NoChange),
        );

        let result = RepositorySyncer::new(&vcs).sync(&git_repo(&dir));

        assert_eq!(
            result,
            SyncResult::Failed {
                failure: SyncFailure::Fetch("could not resolve host".to_string())
            }
        );
        assert_eq!(vcs.calls(), vec!["fetch"]);
    }

    #[test]
    fn test_update_failure() {
        let dir = TempDir::new().unwrap();
        let vcs = ScriptedVcs::new(Ok(()), Err(BackendError::new("diverged")));

        let result = RepositorySyncer::new(&vcs).sync(&git_repo(&dir));

        assert!(result.is_failed());
        assert_eq!(result.to_string(), "update failed: diverged");
    }

    #[test]
    fn test_plain_directory_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("local");
        std::fs::create_dir_all(&path).unwrap();
        let vcs = ScriptedVcs::new(Ok(()), Ok(FastForward::NoChange));

        let result = RepositorySyncer::new(&vcs).sync(&Repository::at(path));

        assert_eq!(
            result,
            SyncResult::Failed {
                failure: SyncFailure::UnsupportedBackend
            }
        );
        assert!(vcs.calls().is_empty());
    }

    #[test]
    fn test_backend_rejecting_repo_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let mut vcs = ScriptedVcs::new(Ok(()), Ok(FastForward::NoChange));
        vcs.is_repo = false;

        let result = RepositorySyncer::new(&vcs).sync(&git_repo(&dir));

        assert!(result.is_failed());
        assert!(vcs.calls().is_empty());
    }
}
