//! Version control backend
//!
//! The syncer only needs three things from version control: recognizing a
//! repository, fetching its upstream, and fast-forwarding the current branch.
//! [`GitBackend`] implements them with `git2`; network operations are bounded
//! by libgit2's own transport timeouts.

use git2::build::CheckoutBuilder;
use git2::{FetchOptions, Repository as GitRepository};
use std::path::Path;
use thiserror::Error;

/// Outcome of a fast-forward-only update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FastForward {
    /// Already at the upstream commit
    NoChange,
    /// Branch moved from `from` to `to` (abbreviated commit ids)
    Changed { from: String, to: String },
}

/// Diagnostic reported by the backend
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<git2::Error> for BackendError {
    fn from(e: git2::Error) -> Self {
        Self::new(e.message())
    }
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Version control operations used to sync a repository
pub trait VersionControl: Send + Sync {
    /// Whether `path` is the root of a repository this backend manages
    fn is_repo(&self, path: &Path) -> bool;

    /// Fetch the upstream of the current branch. Never touches the working tree.
    fn fetch(&self, path: &Path) -> BackendResult<()>;

    /// Move the current branch to its upstream, only if that is a fast-forward
    fn fast_forward_update(&self, path: &Path) -> BackendResult<FastForward>;
}

/// `git2`-backed implementation
#[derive(Debug, Default, Clone, Copy)]
pub struct GitBackend;

impl GitBackend {
    pub fn new() -> Self {
        Self
    }

    fn open(path: &Path) -> BackendResult<GitRepository> {
        GitRepository::open(path).map_err(|e| {
            BackendError::new(format!(
                "Failed to open git repository at {}: {}",
                path.display(),
                e.message()
            ))
        })
    }

    /// Full reference name of the checked-out branch
    fn current_branch(repo: &GitRepository) -> BackendResult<String> {
        let head = repo.head()?;
        if !head.is_branch() {
            return Err(BackendError::new("HEAD is detached; check out a branch to update"));
        }
        head.name()
            .map(str::to_string)
            .ok_or_else(|| BackendError::new("Branch name is not valid UTF-8"))
    }

    /// Full reference name of the branch's upstream (e.g. `refs/remotes/origin/master`)
    fn upstream_of(repo: &GitRepository, branch: &str) -> BackendResult<String> {
        let upstream = repo.branch_upstream_name(branch).map_err(|_| no_upstream(branch))?;
        upstream
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| BackendError::new("Upstream name is not valid UTF-8"))
    }
}

impl VersionControl for GitBackend {
    fn is_repo(&self, path: &Path) -> bool {
        GitRepository::open(path).is_ok()
    }

    fn fetch(&self, path: &Path) -> BackendResult<()> {
        let repo = Self::open(path)?;
        let branch = Self::current_branch(&repo)?;

        let remote_name = repo
            .branch_upstream_remote(&branch)
            .map_err(|_| no_upstream(&branch))?;
        let remote_name = remote_name
            .as_str()
            .ok_or_else(|| BackendError::new("Remote name is not valid UTF-8"))?;

        let mut remote = repo.find_remote(remote_name)?;
        tracing::debug!(
            "Fetching {} from {}",
            path.display(),
            remote.url().unwrap_or(remote_name)
        );

        let mut options = FetchOptions::new();
        remote.fetch(&[] as &[&str], Some(&mut options), None)?;
        Ok(())
    }

    fn fast_forward_update(&self, path: &Path) -> BackendResult<FastForward> {
        let repo = Self::open(path)?;
        let branch = Self::current_branch(&repo)?;
        let upstream = Self::upstream_of(&repo, &branch)?;

        let upstream_oid = repo.refname_to_id(&upstream)?;
        let fetched = repo.find_annotated_commit(upstream_oid)?;
        let (analysis, _) = repo.merge_analysis(&[&fetched])?;

        if analysis.is_up_to_date() {
            return Ok(FastForward::NoChange);
        }
        if !analysis.is_fast_forward() || analysis.is_unborn() {
            return Err(BackendError::new(format!(
                "Not possible to fast-forward `{}` to `{}`: the local history has diverged",
                short_name(&branch),
                short_name(&upstream)
            )));
        }

        let head_oid = repo.refname_to_id(&branch)?;
        let target = repo.find_object(upstream_oid, None)?;

        // Safe checkout refuses to overwrite local modifications, so the
        // branch only moves once the working tree matches the new commit.
        repo.checkout_tree(&target, Some(CheckoutBuilder::new().safe()))?;
        repo.find_reference(&branch)?.set_target(
            upstream_oid,
            &format!("specrepo: fast-forward to {}", short_name(&upstream)),
        )?;

        Ok(FastForward::Changed {
            from: format!("{:.7}", head_oid),
            to: format!("{:.7}", upstream_oid),
        })
    }
}

fn no_upstream(branch: &str) -> BackendError {
    BackendError::new(format!(
        "Branch `{}` has no upstream configured",
        short_name(branch)
    ))
}

fn short_name(refname: &str) -> &str {
    refname
        .strip_prefix("refs/heads/")
        .or_else(|| refname.strip_prefix("refs/remotes/"))
        .unwrap_or(refname)
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;
    use std::fs;
    use tempfile::TempDir;

    fn commit_file(repo: &GitRepository, file: &str, content: &str, message: &str) -> git2::Oid {
        let workdir = repo.workdir().unwrap();
        fs::write(workdir.join(file), content).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new(file)).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();

        let sig = Signature::now("Test", "test@example.com").unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<_> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    /// Upstream repository with one commit and a clone tracking it
    fn setup() -> (TempDir, GitRepository, GitRepository) {
        let dir = TempDir::new().unwrap();
        let upstream = GitRepository::init(dir.path().join("upstream")).unwrap();
        commit_file(&upstream, "README", "hello", "Initial commit");

        let local = GitRepository::clone(
            dir.path().join("upstream").to_str().unwrap(),
            dir.path().join("local"),
        )
        .unwrap();
        (dir, upstream, local)
    }

    #[test]
    fn test_is_repo() {
        let (dir, _, _) = setup();
        let backend = GitBackend::new();
        assert!(backend.is_repo(&dir.path().join("local")));
        assert!(!backend.is_repo(dir.path()));
    }

    #[test]
    fn test_up_to_date() {
        let (dir, _, local) = setup();
        let backend = GitBackend::new();
        let path = dir.path().join("local");
        let before = local.head().unwrap().target();

        backend.fetch(&path).unwrap();
        assert_eq!(backend.fast_forward_update(&path).unwrap(), FastForward::NoChange);
        assert_eq!(local.head().unwrap().target(), before);
    }

    #[test]
    fn test_fast_forward() {
        let (dir, upstream, local) = setup();
        let new_head = commit_file(&upstream, "CHANGELOG", "v2", "Second commit");
        let backend = GitBackend::new();
        let path = dir.path().join("local");

        backend.fetch(&path).unwrap();
        let result = backend.fast_forward_update(&path).unwrap();

        match result {
            FastForward::Changed { to, .. } => assert!(new_head.to_string().starts_with(&to)),
            FastForward::NoChange => panic!("expected the branch to move"),
        }
        assert_eq!(local.head().unwrap().target(), Some(new_head));
        assert_eq!(fs::read_to_string(path.join("CHANGELOG")).unwrap(), "v2");
    }

    #[test]
    fn test_diverged_history_is_refused() {
        let (dir, upstream, local) = setup();
        commit_file(&upstream, "CHANGELOG", "upstream", "Upstream commit");
        let local_head = commit_file(&local, "NOTES", "local", "Local commit");
        let backend = GitBackend::new();
        let path = dir.path().join("local");

        backend.fetch(&path).unwrap();
        let err = backend.fast_forward_update(&path).unwrap_err();

        assert!(err.message.contains("diverged"));
        assert_eq!(local.head().unwrap().target(), Some(local_head));
        assert!(!path.join("CHANGELOG").exists());
    }

    #[test]
    fn test_unreachable_remote() {
        let (dir, _, local) = setup();
        local
            .remote_set_url("origin", dir.path().join("gone").to_str().unwrap())
            .unwrap();
        let backend = GitBackend::new();

        let err = backend.fetch(&dir.path().join("local")).unwrap_err();
        assert!(!err.message.is_empty());
    }

    #[test]
    fn test_no_upstream() {
        let dir = TempDir::new().unwrap();
        let repo = GitRepository::init(dir.path()).unwrap();
        commit_file(&repo, "README", "hello", "Initial commit");

        let err = GitBackend::new().fetch(dir.path()).unwrap_err();
        assert!(err.message.contains("has no upstream configured"));
    }

    #[test]
    fn test_short_name() {
        assert_eq!(short_name("refs/heads/master"), "master");
        assert_eq!(short_name("refs/remotes/origin/master"), "origin/master");
        assert_eq!(short_name("HEAD"), "HEAD");
    }
}
